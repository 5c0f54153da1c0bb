//! CSRF bootstrap: make sure the backend has issued its CSRF cookie.
//!
//! DESIGN
//! ======
//! The cookie is checked first; only when it is missing does the
//! bootstrapper issue one `GET` to the priming endpoint. The cookie itself
//! is stored by the transport's jar as a side effect of that response.
//!
//! Check-then-prime runs behind an async gate and re-checks the cookie
//! once inside, so concurrent startup paths prime at most once. Failures
//! are returned to the caller without retry.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::net::{ApiRequest, CookieStore, Transport, TransportError};

/// What [`CsrfBootstrapper::ensure_csrf_token`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfStatus {
    /// The cookie was already set; no request was made.
    Present,
    /// The priming endpoint was called and answered with `status`.
    Primed { status: u16 },
}

pub struct CsrfBootstrapper {
    transport: Arc<dyn Transport>,
    cookies: Arc<dyn CookieStore>,
    cookie_name: String,
    prime_url: String,
    gate: Mutex<()>,
}

impl CsrfBootstrapper {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        cookies: Arc<dyn CookieStore>,
        cookie_name: impl Into<String>,
        prime_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            cookies,
            cookie_name: cookie_name.into(),
            prime_url: prime_url.into(),
            gate: Mutex::new(()),
        }
    }

    /// True when the CSRF cookie is set to a non-empty value.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.cookies.contains(&self.cookie_name)
    }

    /// Prime the CSRF cookie unless it is already present.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the priming request fails or the
    /// backend answers with a non-2xx status.
    pub async fn ensure_csrf_token(&self) -> Result<CsrfStatus, TransportError> {
        if self.has_token() {
            return Ok(CsrfStatus::Present);
        }

        let _gate = self.gate.lock().await;
        if self.has_token() {
            tracing::debug!(cookie = %self.cookie_name, "CSRF cookie set by a concurrent primer");
            return Ok(CsrfStatus::Present);
        }

        let request = ApiRequest::get(self.prime_url.as_str()).with_header("Accept", "application/json");
        let response = self.transport.send(request).await?;

        if self.has_token() {
            tracing::info!(status = response.status, "CSRF cookie initialized");
        } else {
            tracing::warn!(
                status = response.status,
                cookie = %self.cookie_name,
                "priming request succeeded but no CSRF cookie was stored"
            );
        }
        Ok(CsrfStatus::Primed { status: response.status })
    }
}

#[cfg(test)]
#[path = "csrf_test.rs"]
mod tests;
