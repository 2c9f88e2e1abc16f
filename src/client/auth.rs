//! OAuth2 client-credentials authentication
//!
//! A single [`TokenProvider`] is built per process and shared by reference
//! with every stream. The first caller of [`TokenProvider::get_token`] mints
//! the token; concurrent callers wait on the same lock and then read the
//! cached value.

use super::transport::{HttpRequest, Transport};
use crate::error::ExtractError;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

/// Client credentials used only to mint tokens.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub grant_type: String,
    pub scope: String,
    pub token_endpoint: Url,
}

impl Credentials {
    /// Form-encoded token request body.
    ///
    /// The token endpoint also expects its own URL echoed back as
    /// `access_token_url`.
    pub fn form_body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("grant_type", &self.grant_type)
            .append_pair("access_token_url", self.token_endpoint.as_str())
            .append_pair("scope", &self.scope)
            .finish()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("grant_type", &self.grant_type)
            .field("scope", &self.scope)
            .field("token_endpoint", &self.token_endpoint.as_str())
            .finish()
    }
}

/// A minted bearer token.
#[derive(Clone)]
pub struct Token {
    value: String,
    scope: String,
    obtained_at: Instant,
    expires_in: Option<Duration>,
}

impl Token {
    pub fn new(value: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            scope: scope.into(),
            obtained_at: Instant::now(),
            expires_in: None,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn obtained_at(&self) -> Instant {
        self.obtained_at
    }

    /// Lifetime reported by the token endpoint, if any
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }

    /// `Authorization` header value.
    pub fn header_value(&self) -> Result<HeaderValue, ExtractError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.value))
            .map_err(|_| ExtractError::Auth("token contains invalid header characters".into()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("scope", &self.scope)
            .field("obtained_at", &self.obtained_at)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    scope: Option<String>,
}

/// Mints and caches the process-wide bearer token.
pub struct TokenProvider<T> {
    transport: Arc<T>,
    credentials: Credentials,
    cached: Mutex<Option<Arc<Token>>>,
    mints: AtomicUsize,
}

impl<T: Transport> TokenProvider<T> {
    pub fn new(transport: Arc<T>, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            cached: Mutex::new(None),
            mints: AtomicUsize::new(0),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Return the cached token, minting it on first use.
    ///
    /// # Errors
    /// Returns [`ExtractError::Auth`] if the token endpoint is unreachable,
    /// answers with a non-success status, or omits `access_token`. These
    /// are never retried.
    pub async fn get_token(&self) -> Result<Arc<Token>, ExtractError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(Arc::clone(token));
        }

        let token = Arc::new(self.mint().await?);
        *cached = Some(Arc::clone(&token));
        Ok(token)
    }

    /// Drop the cached token so the next [`get_token`](Self::get_token) mints a new one.
    pub async fn invalidate(&self) {
        log::debug!("Invalidating cached bearer token");
        *self.cached.lock().await = None;
    }

    /// Number of token requests issued so far
    pub fn mint_count(&self) -> usize {
        self.mints.load(Ordering::SeqCst)
    }

    async fn mint(&self) -> Result<Token, ExtractError> {
        self.mints.fetch_add(1, Ordering::SeqCst);
        log::debug!(
            "Requesting bearer token from {} (scope: {})",
            self.credentials.token_endpoint,
            self.credentials.scope
        );

        let mut request = HttpRequest::post(
            self.credentials.token_endpoint.clone(),
            self.credentials.form_body().into_bytes(),
        );
        request.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        request
            .headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| ExtractError::Auth(format!("token request failed: {e}")))?;

        if !response.is_success() {
            let status = response.status;
            let detail = ExtractError::from_status(status, &response.text());
            return Err(ExtractError::Auth(format!(
                "token endpoint returned {status}: {detail}"
            )));
        }

        let body: TokenResponse = serde_json::from_slice(&response.body)
            .map_err(|e| ExtractError::Auth(format!("malformed token response: {e}")))?;

        let value = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExtractError::Auth("token response has no access_token".into()))?;

        log::info!("Obtained bearer token");

        Ok(Token {
            value,
            scope: body.scope.unwrap_or_else(|| self.credentials.scope.clone()),
            obtained_at: Instant::now(),
            expires_in: body.expires_in.map(Duration::from_secs),
        })
    }
}
