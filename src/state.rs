//! Session state and the payloads exchanged with the backend.
//!
//! DESIGN
//! ======
//! `SessionState` is a plain value. The manager owns the only writable copy
//! and publishes every change over a `watch` channel, so consumers read
//! snapshots and never share a mutable reference.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// USER
// =============================================================================

/// The authenticated user record. Its shape belongs to the backend, so the
/// payload is kept as-is and exposed through a few lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct User(Value);

impl User {
    #[must_use]
    pub fn new(record: Value) -> Self {
        Self(record)
    }

    /// A user from a response body; a `null` body means nobody is signed in.
    #[must_use]
    pub fn from_body(body: Value) -> Option<Self> {
        if body.is_null() { None } else { Some(Self(body)) }
    }

    /// Look up a top-level field of the record.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.get("id")
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.get("email").and_then(Value::as_str)
    }

    #[must_use]
    pub fn record(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_record(self) -> Value {
        self.0
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    /// Cached backend identity; `None` when unauthenticated.
    pub current_user: Option<User>,
    /// Failure message of the most recent operation.
    pub error: Option<String>,
    /// True while an operation is in flight.
    pub loading: bool,
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }
}

// =============================================================================
// CREDENTIALS
// =============================================================================

#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct RegisterCredentials {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl RegisterCredentials {
    /// Registration payload with the confirmation set to `password`.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        let password = password.into();
        Self { name: name.into(), email: email.into(), password_confirmation: password.clone(), password }
    }
}

impl fmt::Debug for RegisterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterCredentials")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("password_confirmation", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
