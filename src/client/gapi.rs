//! GAPI REST client
//!
//! Builds `GET {url_base}{path}` requests with the bearer token and the fixed
//! GAPI headers attached, and classifies the response status.

use super::auth::TokenProvider;
use super::transport::{HttpRequest, Transport};
use crate::error::ExtractError;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderName, HeaderValue, USER_AGENT};
use std::sync::Arc;
use url::Url;

/// Header GAPI uses to trace calls back to the caller
pub const CORRELATION_HEADER: &str = "correlation-object";
pub const CORRELATION_VALUE: &str = r#"{"correlationId":"dataplatform"}"#;

/// Client for the GAPI REST endpoints.
///
/// Cheap to clone; clones share the transport and the token cache.
///
/// # Example
/// ```no_run
/// use tap_gapi::client::{Credentials, GapiClient, ReqwestTransport, TokenProvider};
/// use std::sync::Arc;
/// use std::time::Duration;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let transport = Arc::new(ReqwestTransport::try_new(Duration::from_secs(300))?);
/// let credentials = Credentials {
///     client_id: "id".into(),
///     client_secret: "secret".into(),
///     grant_type: "client_credentials".into(),
///     scope: "business/taxonomy".into(),
///     token_endpoint: Url::parse("https://auth.example.com/oauth/token")?,
/// };
/// let tokens = Arc::new(TokenProvider::new(transport.clone(), credentials));
/// let client = GapiClient::new(Url::parse("https://api.example.com")?, transport, tokens);
///
/// let body = client.get("/business/taxonomy/types", &[]).await?;
/// # Ok(())
/// # }
/// ```
pub struct GapiClient<T> {
    url_base: Url,
    transport: Arc<T>,
    tokens: Arc<TokenProvider<T>>,
    user_agent: Option<String>,
}

impl<T> Clone for GapiClient<T> {
    fn clone(&self) -> Self {
        Self {
            url_base: self.url_base.clone(),
            transport: Arc::clone(&self.transport),
            tokens: Arc::clone(&self.tokens),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl<T: Transport> GapiClient<T> {
    pub fn new(url_base: Url, transport: Arc<T>, tokens: Arc<TokenProvider<T>>) -> Self {
        Self {
            url_base,
            transport,
            tokens,
            user_agent: None,
        }
    }

    /// Send `User-Agent` on every request.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn url_base(&self) -> &Url {
        &self.url_base
    }

    pub fn tokens(&self) -> &TokenProvider<T> {
        &self.tokens
    }

    /// Resolve `path` against the base URL and append `query` in order.
    ///
    /// The path is appended to the base as-is, so a base of
    /// `https://host/v1` keeps its `/v1` prefix.
    pub fn url_for(&self, path: &str, query: &[(String, String)]) -> Result<Url, ExtractError> {
        let base = self.url_base.as_str().trim_end_matches('/');
        let path = path.strip_prefix('/').unwrap_or(path);
        let mut url = Url::parse(&format!("{base}/{path}"))
            .map_err(|e| ExtractError::Config(format!("Invalid request URL for '{path}': {e}")))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Build an authenticated GET request, minting the token if needed.
    pub async fn build_get(&self, url: Url) -> Result<HttpRequest, ExtractError> {
        let token = self.tokens.get_token().await?;

        let mut request = HttpRequest::get(url);
        let headers = &mut request.headers;
        headers.insert(AUTHORIZATION, token.header_value()?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(CORRELATION_HEADER),
            HeaderValue::from_static(CORRELATION_VALUE),
        );
        if let Some(user_agent) = &self.user_agent {
            let value = HeaderValue::from_str(user_agent)
                .map_err(|e| ExtractError::Config(format!("Invalid user_agent: {e}")))?;
            headers.insert(USER_AGENT, value);
        }
        Ok(request)
    }

    /// Send a single GET attempt and return the body of a 2xx response.
    ///
    /// Non-success statuses are classified via [`ExtractError::from_status`].
    pub async fn fetch(&self, url: &Url) -> Result<Vec<u8>, ExtractError> {
        let request = self.build_get(url.clone()).await?;
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            log::debug!("GET {} returned {}", url.path(), response.status);
            return Err(ExtractError::from_status(response.status, &response.text()));
        }
        Ok(response.body)
    }

    /// Convenience: resolve `path` + `query` and fetch it once.
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Vec<u8>, ExtractError> {
        let url = self.url_for(path, query)?;
        self.fetch(&url).await
    }
}

impl<T> std::fmt::Display for GapiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url_base)
    }
}
