//! HTTP client for the hosted backend (Supabase-compatible).
//!
//! Two surfaces share one `reqwest::Client`:
//! - `auth`: password sign-in/sign-up, refresh, sign-out (`/auth/v1`)
//! - `query`: table reads/writes through PostgREST (`/rest/v1`)
//!
//! Every request carries the project's anon key in the `apikey` header.
//! Authenticated requests add `Authorization: Bearer <access_token>`.
//! No local timeout is configured; the transport default applies.

mod auth;
mod query;

use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

pub use auth::SignUpOutcome;
pub use query::TableQuery;

use crate::config::BackendSettings;

/// Standard User-Agent header for taskdeck API requests.
pub const USER_AGENT: &str = concat!("taskdeck/", env!("CARGO_PKG_VERSION"));

/// Client for the backend project.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Creates a client from resolved settings.
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        Self::with_url(settings.url.clone(), &settings.anon_key)
    }

    /// Creates a client for a project URL and anon key.
    pub fn with_url(mut base: Url, anon_key: &str) -> Result<Self> {
        // Url::join replaces the last segment unless the path ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base,
            anon_key: anon_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("Invalid endpoint path: {path}"))
    }

    /// Starts a request. Fails if the access token cannot be sent as a header.
    fn request(
        &self,
        method: Method,
        url: Url,
        access_token: Option<&str>,
    ) -> Result<RequestBuilder> {
        let builder = self
            .http
            .request(method, url)
            .header("apikey", &self.anon_key);
        let Some(token) = access_token else {
            return Ok(builder);
        };
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("Access token is not a valid header value")?;
        value.set_sensitive(true);
        Ok(builder.header(AUTHORIZATION, value))
    }
}

/// A non-success response from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub status: StatusCode,
    /// One-line summary suitable for display.
    pub message: String,
}

impl BackendError {
    pub fn new(status: StatusCode, body: &str, operation: &str) -> Self {
        Self {
            status,
            message: error_message(status, body, operation),
        }
    }

    /// True when the backend refused the request itself (4xx), as opposed to
    /// failing to serve it. Timeouts and rate limits are not refusals.
    pub fn is_rejection(&self) -> bool {
        self.status.is_client_error()
            && !matches!(
                self.status,
                StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS
            )
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BackendError {}

/// True if `err` carries a `BackendError` the backend answered with a 4xx.
pub fn is_rejection(err: &anyhow::Error) -> bool {
    err.downcast_ref::<BackendError>()
        .is_some_and(BackendError::is_rejection)
}

/// Sends a request, returning the response only if the status is a success.
///
/// Failures carry the backend's own message when one is present.
async fn send(builder: RequestBuilder, operation: &str) -> Result<Response> {
    let response = builder
        .send()
        .await
        .with_context(|| format!("Failed to {operation}"))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(%status, operation, "backend request failed");
    Err(BackendError::new(status, &body, operation).into())
}

/// Sends a request and decodes the JSON body.
async fn send_json<T: DeserializeOwned>(builder: RequestBuilder, operation: &str) -> Result<T> {
    let response = send(builder, operation).await?;
    let text = response
        .text()
        .await
        .with_context(|| format!("Failed to read response to {operation}"))?;
    serde_json::from_str(&text).with_context(|| format!("Unexpected response to {operation}"))
}

/// Builds a human-readable message for a failed backend call.
///
/// Prefers the message the backend put in the body (auth errors use
/// `error_description`/`msg`, PostgREST uses `message`), falling back to the
/// HTTP status.
pub fn error_message(status: StatusCode, body: &str, operation: &str) -> String {
    const KEYS: [&str; 4] = ["error_description", "msg", "message", "error"];

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        let found = KEYS
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty());
        if let Some(message) = found {
            return message.to_string();
        }
    }

    format!("Failed to {operation}: HTTP {}", status.as_u16())
}

/// Renders an error chain as a single line for display.
pub fn describe(err: &anyhow::Error) -> String {
    format!("{err:#}")
}
