//! Startup wiring: one transport, one cookie jar, one session.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionClient::bootstrap` is what a host application calls at startup:
//! it builds the HTTP transport around a shared cookie jar, primes the CSRF
//! cookie if the jar does not have one, and hands back a ready
//! [`SessionManager`]. The same transport is handed out through
//! [`SessionClient::transport`] so the host's own requests carry the session
//! and CSRF cookies too. Priming failures are logged and swallowed so a
//! backend hiccup never blocks startup; the first mutating call will then
//! surface its own error.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::csrf::{CsrfBootstrapper, CsrfStatus};
use crate::net::{HttpTransport, JarCookieStore, Transport, TransportError};
use crate::session::SessionManager;

pub struct SessionClient {
    config: ClientConfig,
    transport: Arc<HttpTransport>,
    cookies: Arc<JarCookieStore>,
    csrf: CsrfBootstrapper,
    session: SessionManager,
}

impl SessionClient {
    /// Wire the client without touching the network.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built for `config`.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        let cookies = transport.cookie_store();
        let csrf = CsrfBootstrapper::new(
            transport.clone(),
            cookies.clone(),
            config.csrf_cookie_name.as_str(),
            config.csrf_prime_url(),
        );
        let session = SessionManager::new(transport.clone(), config.endpoints.clone());
        Ok(Self { config, transport, cookies, csrf, session })
    }

    /// Wire the client and prime the CSRF cookie (soft-fail).
    ///
    /// # Errors
    ///
    /// Returns an error only if the HTTP client cannot be built; priming
    /// failures are logged, not returned.
    pub async fn bootstrap(config: ClientConfig) -> Result<Self, TransportError> {
        let client = Self::new(config)?;
        client.prime_csrf().await;
        Ok(client)
    }

    /// Run the CSRF bootstrapper, logging instead of failing.
    /// Returns `None` when priming failed.
    pub async fn prime_csrf(&self) -> Option<CsrfStatus> {
        match self.csrf.ensure_csrf_token().await {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::warn!(error = %e, url = %self.config.csrf_prime_url(), "CSRF priming failed; continuing without cookie");
                None
            }
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// The configured transport the session runs on. Requests sent through
    /// it share the cookie jar and get the CSRF header on `POST`.
    #[must_use]
    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    #[must_use]
    pub fn csrf(&self) -> &CsrfBootstrapper {
        &self.csrf
    }

    #[must_use]
    pub fn cookies(&self) -> &JarCookieStore {
        &self.cookies
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
