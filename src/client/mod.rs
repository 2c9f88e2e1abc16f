//! GAPI API client and authentication.
//!
//! This module provides the [`GapiClient`] for issuing authenticated requests,
//! the shared [`TokenProvider`], the [`Transport`] seam and the
//! [`RetryPolicy`] applied to transient failures.

mod auth;
mod gapi;
mod retry;
mod transport;

pub use auth::{Credentials, Token, TokenProvider};
pub use gapi::{CORRELATION_HEADER, CORRELATION_VALUE, GapiClient};
pub use retry::RetryPolicy;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
