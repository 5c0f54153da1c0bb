//! `reqwest`-backed transport.
//!
//! DESIGN
//! ======
//! One `reqwest::Client` with a shared cookie jar carries the session and
//! CSRF cookies across every call. Mutating requests read the CSRF cookie
//! back out of that jar and echo it in the configured header, which is the
//! client half of the double-submit check.
//!
//! Relative paths are appended to the base URL verbatim (not `Url::join`),
//! so a base with a path prefix keeps it.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use reqwest::cookie::Jar;
use reqwest::header::ACCEPT;
use serde_json::Value;

use super::cookies::{CookieStore, JarCookieStore};
use super::types::{ApiRequest, ApiResponse, Method, Transport, TransportError};
use crate::config::ClientConfig;

const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    cookies: Arc<JarCookieStore>,
    csrf_cookie_name: String,
    csrf_header_name: String,
}

impl HttpTransport {
    /// Build the HTTP client, its cookie jar and timeouts from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let origin = Url::parse(&config.base_url).map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            cookies: Arc::new(JarCookieStore::new(jar, origin)),
            csrf_cookie_name: config.csrf_cookie_name.clone(),
            csrf_header_name: config.csrf_header_name.clone(),
        })
    }

    /// The cookie jar this transport sends with, as a [`CookieStore`].
    #[must_use]
    pub fn cookie_store(&self) -> Arc<JarCookieStore> {
        Arc::clone(&self.cookies)
    }

    fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        let raw = if is_absolute(path) { path.to_owned() } else { format!("{}{}", self.base_url, path) };
        Url::parse(&raw).map_err(|e| TransportError::InvalidUrl(format!("{raw}: {e}")))
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.resolve(&request.path)?;
        let mut builder = match request.method {
            Method::Get => self.http.get(url.clone()),
            Method::Post => self.http.post(url.clone()),
        };

        if !request.has_header(ACCEPT.as_str()) {
            builder = builder.header(ACCEPT, DEFAULT_ACCEPT);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.method.is_mutating() {
            match self.cookies.get(&self.csrf_cookie_name) {
                Some(token) => builder = builder.header(self.csrf_header_name.as_str(), token),
                None => tracing::debug!(%url, cookie = %self.csrf_cookie_name, "no CSRF cookie to echo"),
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = request.method.as_str(), %url, "sending request");
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let body = parse_body(&text);

        if !(200..300).contains(&status) {
            tracing::debug!(%url, status, "request rejected");
            return Err(TransportError::Status { status, body });
        }
        Ok(ApiResponse::new(status, body))
    }
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Empty → `null`, JSON → parsed, anything else → the raw text as a JSON string.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
