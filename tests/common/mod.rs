//! Shared fixtures: an in-memory GAPI that serves scripted responses

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tap_gapi::client::{
    Credentials, GapiClient, HttpRequest, HttpResponse, RetryPolicy, TokenProvider, Transport,
};
use tap_gapi::{ExtractError, ExtractionEngine};
use url::Url;

pub const API_BASE: &str = "https://gapi.example.com/api";
pub const TOKEN_URL: &str = "https://auth.example.com/oauth2/token";

/// Token endpoint plus per-path response queues. A path whose queue runs dry
/// keeps answering with its last response; unknown paths answer 404.
#[derive(Default)]
pub struct FakeGapi {
    token_status: Mutex<u16>,
    pages: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    last: Mutex<HashMap<String, HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeGapi {
    pub fn new() -> Arc<Self> {
        let fake = Self::default();
        *fake.token_status.lock().unwrap() = 200;
        Arc::new(fake)
    }

    pub fn reject_tokens(&self, status: u16) {
        *self.token_status.lock().unwrap() = status;
    }

    /// Queue a response for `path` (relative to the API base path)
    pub fn respond(&self, path: &str, status: u16, body: serde_json::Value) {
        self.pages
            .lock()
            .unwrap()
            .entry(format!("/api{path}"))
            .or_default()
            .push_back(HttpResponse::new(status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn token_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == reqwest::Method::POST)
            .count()
    }

    /// GETs to `path`, as decoded query pairs
    pub fn queries_for(&self, path: &str) -> Vec<Vec<(String, String)>> {
        let full = format!("/api{path}");
        self.requests()
            .iter()
            .filter(|r| r.method == reqwest::Method::GET && r.url.path() == full)
            .map(|r| r.url.query_pairs().into_owned().collect())
            .collect()
    }
}

impl Transport for FakeGapi {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ExtractError> {
        self.requests.lock().unwrap().push(request.clone());

        if request.method == reqwest::Method::POST {
            let status = *self.token_status.lock().unwrap();
            return Ok(HttpResponse::new(
                status,
                r#"{"access_token":"integration-token","token_type":"Bearer","expires_in":3600}"#,
            ));
        }

        let path = request.url.path().to_string();
        let next = self
            .pages
            .lock()
            .unwrap()
            .get_mut(&path)
            .and_then(VecDeque::pop_front);
        let mut last = self.last.lock().unwrap();
        Ok(match next {
            Some(response) => {
                last.insert(path, response.clone());
                response
            }
            None => last
                .get(&path)
                .cloned()
                .unwrap_or_else(|| HttpResponse::new(404, "no such resource")),
        })
    }
}

pub fn credentials(scope: &str) -> Credentials {
    Credentials {
        client_id: "integration-client".into(),
        client_secret: "integration-secret".into(),
        grant_type: "client_credentials".into(),
        scope: scope.into(),
        token_endpoint: Url::parse(TOKEN_URL).unwrap(),
    }
}

pub fn engine(fake: &Arc<FakeGapi>, scope: &str) -> ExtractionEngine<FakeGapi> {
    let tokens = Arc::new(TokenProvider::new(fake.clone(), credentials(scope)));
    let client = GapiClient::new(Url::parse(API_BASE).unwrap(), fake.clone(), tokens);
    ExtractionEngine::new(client, RetryPolicy::immediate(3))
}
