//! Cookie store capability.
//!
//! DESIGN
//! ======
//! The CSRF check and the header echo both need "read cookie by name" and
//! nothing else. That capability is injected as a trait object instead of
//! reaching into a global jar, so the bootstrapper can run against an
//! in-memory store in tests.

use std::sync::Arc;

use reqwest::Url;
use reqwest::cookie::{CookieStore as _, Jar};

/// Read-only view of the cookies the backend has set for this client.
pub trait CookieStore: Send + Sync {
    /// Decoded value of the named cookie, if set.
    fn get(&self, name: &str) -> Option<String>;

    /// True when the cookie is set to a non-empty value.
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| !value.is_empty())
    }
}

/// [`CookieStore`] over the `reqwest` jar shared with [`super::HttpTransport`],
/// scoped to the backend origin.
#[derive(Clone)]
pub struct JarCookieStore {
    jar: Arc<Jar>,
    url: Url,
}

impl JarCookieStore {
    #[must_use]
    pub fn new(jar: Arc<Jar>, url: Url) -> Self {
        Self { jar, url }
    }
}

impl CookieStore for JarCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.url)?;
        let Ok(raw) = header.to_str() else {
            return None;
        };
        find_cookie(raw, name)
    }
}

/// Find `name` in a `Cookie` header string (`a=1; b=2`) and URL-decode its value.
///
/// Backends URL-encode the CSRF token when setting the cookie; the header
/// echo must carry the decoded value.
pub(crate) fn find_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| decode_value(value))
}

fn decode_value(value: &str) -> String {
    match urlencoding::decode(value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value.to_owned(),
    }
}

#[cfg(test)]
#[path = "cookies_test.rs"]
mod tests;
