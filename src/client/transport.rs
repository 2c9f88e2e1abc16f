//! HTTP transport seam
//!
//! The engine and the token provider talk to the network only through
//! [`Transport`]. [`ReqwestTransport`] is the real implementation; tests
//! substitute a scripted one.

use crate::error::ExtractError;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Connect timeout, separate from the whole-request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// A fully built outbound request.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn post(url: Url, body: Vec<u8>) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }

    /// `METHOD url` for error context; never includes headers or body.
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// Status and raw body of a response; status interpretation is up to the caller.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one request, once.
///
/// Returns `Err` only for transport-level failures (timeouts, connection
/// errors); any HTTP status, including 5xx, comes back as `Ok`.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, ExtractError>> + Send;
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport whose every request is bounded by `timeout`.
    pub fn try_new(timeout: Duration) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ExtractError> {
        log::trace!("{}", request.describe());

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ExtractError::from_reqwest(&e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ExtractError::from_reqwest(&e))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_omits_headers() {
        let url = Url::parse("https://api.example.com/business/taxonomy/types").unwrap();
        let mut request = HttpRequest::get(url);
        request
            .headers
            .insert(reqwest::header::AUTHORIZATION, "Bearer secret".parse().unwrap());

        let described = request.describe();
        assert_eq!(
            described,
            "GET https://api.example.com/business/taxonomy/types"
        );
        assert!(!described.contains("secret"));
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "{}").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(429, "").is_success());
    }

    #[test]
    fn test_transport_builds() {
        assert!(ReqwestTransport::try_new(Duration::from_secs(5)).is_ok());
    }
}
