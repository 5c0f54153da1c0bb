//! Session manager: the four lifecycle operations over one shared state.
//!
//! ARCHITECTURE
//! ============
//! Every operation follows the same shape: take the queue slot, raise
//! `loading` and clear `error`, talk to the backend, write `current_user`
//! and/or `error`, then drop the loading guard. State changes go out over a
//! `watch` channel so consumers react to them without polling.
//!
//! Operations are serialized through a single-slot async queue. A call made
//! while another is in flight waits for it, so concurrent callers observe
//! a deterministic last-issued-wins order instead of interleaved writes.
//!
//! TRADE-OFFS
//! ==========
//! `login` and `register` are not atomic with the identity fetch that
//! follows them. When the credential call succeeds but the fetch fails, the
//! fetch's own failure path owns the outcome: `current_user` is cleared and
//! `error` carries the fetch message, not a login/register one.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::config::Endpoints;
use crate::net::{ApiRequest, Transport, TransportError};
use crate::state::{LoginCredentials, RegisterCredentials, SessionState, User};

// =============================================================================
// OPERATION / ERROR
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchUser,
    Login,
    Register,
    Logout,
}

impl Operation {
    /// User-visible text when the backend gives no `message`.
    #[must_use]
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::FetchUser => "Failed to fetch user",
            Self::Login => "Login failed",
            Self::Register => "Registration failed",
            Self::Logout => "Logout failed",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchUser => "fetch_user",
            Self::Login => "login",
            Self::Register => "register",
            Self::Logout => "logout",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed session operation. `message` is exactly what was written into
/// [`SessionState::error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SessionError {
    /// The operation whose failure path produced the message.
    pub operation: Operation,
    pub message: String,
}

impl SessionError {
    fn from_transport(operation: Operation, err: &TransportError) -> Self {
        let message = err
            .server_message()
            .unwrap_or(operation.fallback_message())
            .to_owned();
        Self { operation, message }
    }
}

// =============================================================================
// LOADING GUARD
// =============================================================================

/// Holds `loading = true` for its lifetime. Dropping it (on return, on
/// error, or when the operation's future is dropped) clears the flag.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SessionState>,
}

impl<'a> LoadingGuard<'a> {
    fn begin(state: &'a watch::Sender<SessionState>) -> Self {
        state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.loading = false);
    }
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

pub struct SessionManager {
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
    state: watch::Sender<SessionState>,
    queue: Mutex<()>,
}

impl SessionManager {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, endpoints: Endpoints) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { transport, endpoints, state, queue: Mutex::new(()) }
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every state change from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().current_user.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Refresh `current_user` from the backend.
    ///
    /// # Errors
    ///
    /// On failure `current_user` is cleared and the returned error carries
    /// the message stored in `error`.
    pub async fn fetch_user(&self) -> Result<Option<User>, SessionError> {
        let _slot = self.queue.lock().await;
        let _loading = LoadingGuard::begin(&self.state);
        self.load_current_user().await
    }

    /// Sign in, then load the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns the login failure (with `current_user` untouched), or the
    /// identity fetch failure (with `current_user` cleared).
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Option<User>, SessionError> {
        let _slot = self.queue.lock().await;
        let _loading = LoadingGuard::begin(&self.state);
        self.exchange_credentials(Operation::Login, &self.endpoints.login, credentials)
            .await?;
        tracing::info!(email = %credentials.email, "login accepted");
        self.load_current_user().await
    }

    /// Create an account, then load the new user.
    ///
    /// # Errors
    ///
    /// Same failure rules as [`Self::login`].
    pub async fn register(&self, credentials: &RegisterCredentials) -> Result<Option<User>, SessionError> {
        let _slot = self.queue.lock().await;
        let _loading = LoadingGuard::begin(&self.state);
        self.exchange_credentials(Operation::Register, &self.endpoints.register, credentials)
            .await?;
        tracing::info!(email = %credentials.email, "registration accepted");
        self.load_current_user().await
    }

    /// End the backend session.
    ///
    /// # Errors
    ///
    /// On failure `current_user` is left as it was.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let _slot = self.queue.lock().await;
        let _loading = LoadingGuard::begin(&self.state);
        let request = ApiRequest::post(self.endpoints.logout.as_str(), serde_json::json!({}));
        match self.transport.send(request).await {
            Ok(_) => {
                self.state.send_modify(|s| s.current_user = None);
                tracing::info!("logged out");
                Ok(())
            }
            Err(err) => Err(self.fail(Operation::Logout, &err)),
        }
    }

    /// The identity fetch step shared by `fetch_user`, `login` and `register`.
    /// Runs inside the caller's queue slot and loading guard, which has
    /// already cleared `error`.
    async fn load_current_user(&self) -> Result<Option<User>, SessionError> {
        match self
            .transport
            .send(ApiRequest::get(self.endpoints.user.as_str()))
            .await
        {
            Ok(response) => {
                let user = User::from_body(response.body);
                tracing::debug!(authenticated = user.is_some(), "current user loaded");
                self.state.send_modify(|s| s.current_user = user.clone());
                Ok(user)
            }
            Err(err) => Err(self.fail(Operation::FetchUser, &err)),
        }
    }

    async fn exchange_credentials(
        &self,
        operation: Operation,
        path: &str,
        credentials: &(impl serde::Serialize + Sync),
    ) -> Result<(), SessionError> {
        let request = ApiRequest::post_json(path, credentials).map_err(|err| self.fail(operation, &err))?;
        self.transport
            .send(request)
            .await
            .map(|_| ())
            .map_err(|err| self.fail(operation, &err))
    }

    /// Record a failure in state and build the error returned to the caller.
    /// Only an identity fetch failure clears `current_user`.
    fn fail(&self, operation: Operation, err: &TransportError) -> SessionError {
        let failure = SessionError::from_transport(operation, err);
        tracing::warn!(
            %operation,
            status = ?err.status(),
            error = %err,
            message = %failure.message,
            "session operation failed"
        );
        self.state.send_modify(|s| {
            if operation == Operation::FetchUser {
                s.current_user = None;
            }
            s.error = Some(failure.message.clone());
        });
        failure
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
