//! # session-client
//!
//! Client-side session manager for cookie-session backends that guard
//! mutating requests with a CSRF double-submit cookie (Laravel Sanctum SPA
//! style).
//!
//! The crate primes the CSRF cookie once at startup, then runs the
//! fetch/login/register/logout lifecycle against a single shared session
//! state that consumers observe through snapshots or a `watch` channel.
//! Start with [`SessionClient::bootstrap`].

pub mod client;
pub mod config;
pub mod csrf;
pub mod net;
pub mod session;
pub mod state;

pub use client::SessionClient;
pub use config::{ClientConfig, ConfigError, Endpoints, Timeouts};
pub use csrf::{CsrfBootstrapper, CsrfStatus};
pub use net::{CookieStore, Transport, TransportError};
pub use session::{Operation, SessionError, SessionManager};
pub use state::{LoginCredentials, RegisterCredentials, SessionState, User};
