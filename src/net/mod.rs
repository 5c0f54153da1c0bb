//! Backend transport: request/response types, cookie access, HTTP client.
//!
//! DESIGN
//! ======
//! Split by concern so the session logic depends only on `types`:
//! - `types`: the [`Transport`] seam and its request/response/error types
//! - `cookies`: the [`CookieStore`] capability and its jar-backed impl
//! - `http`: the `reqwest` implementation used outside of tests

pub mod cookies;
pub mod http;
pub mod types;

pub use cookies::{CookieStore, JarCookieStore};
pub use http::HttpTransport;
pub use types::{ApiRequest, ApiResponse, Method, Transport, TransportError};

// =============================================================================
// TEST HELPERS
// =============================================================================
