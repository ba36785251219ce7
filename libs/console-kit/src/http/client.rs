//! Traced HTTP client bound to a [`Session`].
//!
//! Every request carries `Content-Type: application/json`, the session's
//! bearer token when one is present, and runs inside an `outgoing_http`
//! span that records the response status.

use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::{field, Instrument, Level};

use crate::error::ApiError;
use crate::session::Session;

#[derive(Clone)]
pub struct TracedClient {
    inner: reqwest::Client,
    session: Session,
}

impl TracedClient {
    pub fn new(inner: reqwest::Client, session: Session) -> Self {
        Self { inner, session }
    }

    /// Build a client whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration, session: Session) -> Result<Self, ApiError> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(e.to_string()))?;
        Ok(Self::new(inner, session))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get a reference to the underlying reqwest::Client for advanced usage
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Request builder with JSON content type and the current bearer token.
    pub fn request(&self, method: reqwest::Method, url: url::Url) -> reqwest::RequestBuilder {
        let mut builder = self
            .inner
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = self.session.token().filter(|t| !t.is_empty()) {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
    }

    /// Execute a built request inside an `outgoing_http` span.
    pub async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let span = tracing::span!(
            Level::INFO, "outgoing_http",
            http.method = %req.method(),
            http.url = %req.url(),
            http.status_code = field::Empty,
            error = field::Empty,
        );

        let response = self
            .inner
            .execute(req)
            .instrument(span.clone())
            .await;

        match &response {
            Ok(resp) => {
                let status = resp.status();
                span.record("http.status_code", status.as_u16());
                if status.is_client_error() || status.is_server_error() {
                    span.record("error", true);
                }
            }
            Err(e) => {
                span.record("error", true);
                span.in_scope(|| tracing::debug!(error = %e, "request failed"));
            }
        }
        response
    }

    /// Build and execute in one step.
    pub async fn send(&self, builder: reqwest::RequestBuilder) -> reqwest::Result<reqwest::Response> {
        let req = builder.build()?;
        self.execute(req).await
    }
}

impl Default for TracedClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), Session::new())
    }
}
