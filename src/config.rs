//! Client configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! A single `base_url` drives both the API base and the absolute CSRF
//! priming URL. Everything else has a Sanctum-compatible default, so
//! `ClientConfig::new(base_url)` is enough for most callers.

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_CSRF_COOKIE: &str = "XSRF-TOKEN";
pub const DEFAULT_CSRF_HEADER: &str = "X-XSRF-TOKEN";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors produced while building a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The base URL is not an absolute `http`/`https` URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Backend paths, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub csrf_cookie: String,
    pub login: String,
    pub register: String,
    pub logout: String,
    pub user: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            csrf_cookie: "/sanctum/csrf-cookie".into(),
            login: "/login".into(),
            register: "/register".into(),
            logout: "/logout".into(),
            user: "/api/user".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin without a trailing slash (e.g. `"http://localhost:8000"`).
    pub base_url: String,
    /// Cookie the backend uses to hand out the CSRF token.
    pub csrf_cookie_name: String,
    /// Request header the token is echoed in on mutating requests.
    pub csrf_header_name: String,
    pub endpoints: Endpoints,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Build a config for `base_url` with default cookie names, paths and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] unless `base_url` starts with
    /// `http://` or `https://` and names a host.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(&base_url.into())?,
            csrf_cookie_name: DEFAULT_CSRF_COOKIE.into(),
            csrf_header_name: DEFAULT_CSRF_HEADER.into(),
            endpoints: Endpoints::default(),
            timeouts: Timeouts::default(),
        })
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `SESSION_BASE_URL`: default `http://localhost:8000`
    /// - `SESSION_CSRF_COOKIE`: default `XSRF-TOKEN`
    /// - `SESSION_CSRF_HEADER`: default `X-XSRF-TOKEN`
    /// - `SESSION_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SESSION_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is malformed or a timeout is not an integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_base_url(None)
    }

    /// Like [`Self::from_env`], but an explicit `base_url` wins and
    /// `SESSION_BASE_URL` is not read at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen base URL is malformed or a timeout is
    /// not an integer.
    pub fn from_env_with_base_url(base_url: Option<String>) -> Result<Self, ConfigError> {
        let base_url = base_url
            .or_else(|| env_string("SESSION_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let mut config = Self::new(base_url)?;

        if let Some(name) = env_string("SESSION_CSRF_COOKIE") {
            config.csrf_cookie_name = name;
        }
        if let Some(name) = env_string("SESSION_CSRF_HEADER") {
            config.csrf_header_name = name;
        }
        config.timeouts = Timeouts {
            request_secs: env_parse_u64("SESSION_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse_u64("SESSION_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };

        Ok(config)
    }

    /// Absolute URL of the CSRF priming endpoint.
    #[must_use]
    pub fn csrf_prime_url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoints.csrf_cookie)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"));
    match host {
        Some(rest) if !rest.is_empty() => Ok(trimmed.to_owned()),
        _ => Err(ConfigError::InvalidBaseUrl(raw.to_owned())),
    }
}

fn env_string(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn env_parse_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = env_string(key) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidValue { key, value: raw })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
