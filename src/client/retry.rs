//! Bounded exponential backoff for transient HTTP failures

use crate::error::ExtractError;
use std::future::Future;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Duration;

/// Attempt ceiling and delay curve for retrying a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// No sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `max_delay`, then jittered by up to ±25%.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.delay_for_label("", attempt)
    }

    /// [`delay_for`](Self::delay_for) with the jitter seeded by `label`, so
    /// streams failing on the same attempt wait different amounts.
    pub fn delay_for_label(&self, label: &str, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self
            .base_delay
            .saturating_mul(2u32.pow(exp))
            .min(self.max_delay);
        jitter(delay, label, attempt)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt ceiling is reached. The last error is returned on exhaustion.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ExtractError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExtractError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay_for_label(label, attempt);
                    log::warn!(
                        "{label}: attempt {attempt}/{max_attempts} failed: {e}, retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        log::error!("{label}: giving up after {attempt} attempt(s): {e}");
                    }
                    return Err(e);
                }
            }
        }
    }
}

const JITTER_STEPS: u64 = 10_000;

/// Offset of `delay` by a fraction in [-25%, +25%] derived from a hash of
/// `(label, attempt)`. Deterministic for a given pair.
fn jitter(delay: Duration, label: &str, attempt: u32) -> Duration {
    let millis = delay.as_millis() as f64;
    if millis < 4.0 {
        return delay;
    }
    let mut hasher = DefaultHasher::new();
    label.hash(&mut hasher);
    attempt.hash(&mut hasher);
    let unit = (hasher.finish() % (JITTER_STEPS + 1)) as f64 / JITTER_STEPS as f64;
    let offset = millis * 0.25 * (2.0 * unit - 1.0);
    Duration::from_millis((millis + offset).max(1.0) as u64)
}
