//! Transport types: requests, responses, errors and the `Transport` seam.
//!
//! The session manager and the CSRF bootstrapper only ever talk to the
//! backend through [`Transport`], so tests can swap the HTTP stack for a
//! scripted mock.

use serde::Serialize;
use serde_json::Value;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by transport operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The request URL could not be parsed.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// The request body could not be serialized to JSON.
    #[error("request encode failed: {0}")]
    Encode(String),

    /// The request never produced a response (connect, timeout, body read).
    #[error("http request failed: {0}")]
    Request(String),

    /// The backend answered with a non-2xx status.
    #[error("server returned status {status}")]
    Status { status: u16, body: Value },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl TransportError {
    /// HTTP status of a rejected response, if the backend answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The structured `message` field of a backend error body.
    ///
    /// Empty strings count as absent so callers fall back to their default text.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => body
                .get("message")
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty()),
            _ => None,
        }
    }
}

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Mutating requests carry the CSRF header.
    #[must_use]
    pub fn is_mutating(self) -> bool {
        matches!(self, Self::Post)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A single backend call. `path` is either relative to the configured base
/// URL (`/api/user`) or absolute (`http://host/sanctum/csrf-cookie`).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::Get, path: path.into(), headers: Vec::new(), body: None }
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self { method: Method::Post, path: path.into(), headers: Vec::new(), body: Some(body) }
    }

    /// Build a `POST` whose body is `payload` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Encode`] if `payload` cannot be serialized.
    pub fn post_json(path: impl Into<String>, payload: &impl Serialize) -> Result<Self, TransportError> {
        let body = serde_json::to_value(payload).map_err(|e| TransportError::Encode(e.to_string()))?;
        Ok(Self::post(path, body))
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header presence check.
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

/// A successful (2xx) backend response. Empty bodies decode to `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub fn no_content() -> Self {
        Self { status: 204, body: Value::Null }
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Sends requests to the session backend with credentials attached.
///
/// Implementations must attach cookies to every request, echo the CSRF
/// cookie as a header on mutating requests, and report non-2xx responses
/// as [`TransportError::Status`].
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and wait for its response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the request fails or the backend
    /// answers with a non-2xx status.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
