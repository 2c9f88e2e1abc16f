//! Error taxonomy for the extraction engine
//!
//! Every failure the engine can surface falls into one of five kinds. Only
//! [`ExtractError::TransientHttp`] is ever retried; the rest abort either the
//! whole run (configuration, authentication) or the current stream.

use thiserror::Error;

/// A classified extraction failure.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Missing or invalid configuration, detected before any network call
    #[error("configuration error: {0}")]
    Config(String),

    /// The token endpoint rejected the credentials or answered with garbage
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Timeouts, connection failures, 5xx and 429 responses
    #[error("transient HTTP failure: {message}")]
    TransientHttp {
        status: Option<u16>,
        message: String,
    },

    /// 4xx responses other than 429
    #[error("HTTP {status}: {message}")]
    ClientHttp { status: u16, message: String },

    /// Body is not JSON, or the records path did not land on an object envelope
    #[error("malformed response: {0}")]
    ResponseFormat(String),
}

impl ExtractError {
    /// Only transient HTTP failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientHttp { .. })
    }

    /// Errors that would hit every sibling stream the same way.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Auth(_))
    }

    /// Classify a non-success HTTP status.
    ///
    /// `body` is truncated so a large HTML error page doesn't flood the logs.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = snippet(body);
        match status {
            429 | 500..=599 => Self::TransientHttp {
                status: Some(status),
                message: format!("HTTP {status}: {message}"),
            },
            _ => Self::ClientHttp { status, message },
        }
    }

    /// Classify a transport-level reqwest failure.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::ResponseFormat(e.to_string());
        }
        let kind = if e.is_timeout() {
            "timed out"
        } else if e.is_connect() {
            "connection failed"
        } else {
            "request failed"
        };
        // Strip URL from error to keep query tokens out of the logs
        let mut message = e.to_string();
        if let Some(url) = e.url() {
            message = message.replace(url.as_str(), "<url>");
        }
        Self::TransientHttp {
            status: e.status().map(|s| s.as_u16()),
            message: format!("{kind}: {message}"),
        }
    }
}

fn snippet(body: &str) -> String {
    const MAX: usize = 256;
    let body = body.trim();
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

/// A stream-scoped failure: what broke, and on which request.
#[derive(Debug, Error)]
#[error("stream '{stream}' failed on {request}: {error}")]
pub struct StreamFailure {
    pub stream: String,
    /// Last attempted request, e.g. `GET https://host/path?activeStatus=ALL`
    pub request: String,
    #[source]
    pub error: ExtractError,
}

impl StreamFailure {
    pub fn new(stream: impl Into<String>, request: impl Into<String>, error: ExtractError) -> Self {
        Self {
            stream: stream.into(),
            request: request.into(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_429_and_5xx_are_transient() {
        for status in [429, 500, 502, 503, 599] {
            let err = ExtractError::from_status(status, "busy");
            assert!(err.is_retryable(), "{status} should be retryable");
        }
    }

    #[test]
    fn test_other_4xx_are_client_errors() {
        for status in [400, 401, 403, 404, 422] {
            let err = ExtractError::from_status(status, "nope");
            assert!(!err.is_retryable());
            assert!(matches!(err, ExtractError::ClientHttp { status: s, .. } if s == status));
        }
    }

    #[test]
    fn test_run_fatal_kinds() {
        assert!(ExtractError::Auth("bad".into()).is_run_fatal());
        assert!(ExtractError::Config("missing".into()).is_run_fatal());
        assert!(!ExtractError::ResponseFormat("x".into()).is_run_fatal());
        assert!(!ExtractError::from_status(404, "").is_run_fatal());
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let err = ExtractError::from_status(404, &body);
        let msg = err.to_string();
        assert!(msg.len() < 300);
        assert!(msg.ends_with('…'));
    }

    #[test]
    fn test_stream_failure_display() {
        let failure = StreamFailure::new(
            "costcenter",
            "GET https://api.example.com/finance/chart-of-account/cost-center",
            ExtractError::from_status(404, "not found"),
        );
        let msg = failure.to_string();
        assert!(msg.contains("costcenter"));
        assert!(msg.contains("HTTP 404"));
    }
}
