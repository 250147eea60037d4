//! Origin-scoped cookie jar.
//!
//! Storage and matching follow RFC 6265 via `cookie_store`: a cookie set
//! without a `Domain` attribute is host-only, `Path` and `Secure` restrict
//! which requests carry it, and `Max-Age` takes precedence over `Expires`.
//! The jar serialises to JSON so a login survives between runs.

use std::io::BufReader;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use cookie_store::{CookieStore, RawCookie};
use reqwest::header::HeaderValue;
use reqwest::Url;
use tracing::debug;

use crate::error::GatewayError;

/// Cookie whose presence gates the authenticated views.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

#[derive(Debug, Default)]
pub struct CookieJar {
    store: RwLock<CookieStore>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a jar from [`CookieJar::to_json`] output. Cookies that
    /// expired in the meantime are dropped.
    pub fn from_json(raw: &str) -> Result<Self, GatewayError> {
        let store = cookie_store::serde::json::load(BufReader::new(raw.as_bytes()))
            .map_err(|e| GatewayError::Cookies(e.to_string()))?;
        Ok(Self {
            store: RwLock::new(store),
        })
    }

    /// Serialise the jar, session cookies included.
    pub fn to_json(&self) -> Result<String, GatewayError> {
        let mut out = Vec::new();
        cookie_store::serde::json::save_incl_expired_and_nonpersistent(&self.read(), &mut out)
            .map_err(|e| GatewayError::Cookies(e.to_string()))?;
        String::from_utf8(out).map_err(|e| GatewayError::Cookies(e.to_string()))
    }

    /// Value of `name` as it would be sent to `url`.
    pub fn get(&self, url: &Url, name: &str) -> Option<String> {
        self.read()
            .matches(url)
            .into_iter()
            .find(|c| c.name() == name)
            .map(|c| c.value().to_string())
    }

    /// Store `name=value` as a host-only cookie for `url`'s host.
    pub fn insert(&self, url: &Url, name: &str, value: &str) {
        let raw = RawCookie::build((name.to_string(), value.to_string()))
            .path("/")
            .build();
        match self.write().insert_raw(&raw, url) {
            Ok(_) => debug!(cookie = name, host = url.host_str(), "cookie stored"),
            Err(e) => debug!(cookie = name, "cookie rejected: {e}"),
        }
    }

    /// Drop every cookie named `name` that `url` would receive.
    pub fn remove(&self, url: &Url, name: &str) -> Option<String> {
        let mut store = self.write();
        let keys: Vec<(String, String)> = store
            .matches(url)
            .into_iter()
            .filter(|c| c.name() == name)
            .map(|c| (String::from(&c.domain), String::from(&c.path)))
            .collect();
        keys.iter()
            .filter_map(|(domain, path)| store.remove(domain, path, name))
            .last()
            .map(|c| c.value().to_string())
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.read().iter_unexpired().next().is_none()
    }

    pub fn access_token(&self, url: &Url) -> Option<String> {
        self.get(url, ACCESS_TOKEN_COOKIE)
    }

    fn read(&self) -> RwLockReadGuard<'_, CookieStore> {
        // A poisoned store is still structurally valid.
        self.store.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CookieStore> {
        self.store.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl reqwest::cookie::CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let parsed = cookie_headers.filter_map(|header| {
            let raw = header.to_str().ok()?;
            RawCookie::parse(raw.to_string()).ok()
        });
        self.write().store_response_cookies(parsed, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self
            .read()
            .get_request_values(url)
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::cookie::CookieStore as _;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn receive(jar: &CookieJar, from: &str, header: &'static str) {
        let value = HeaderValue::from_static(header);
        jar.set_cookies(&mut std::iter::once(&value), &url(from));
    }

    #[test]
    fn stores_cookie_from_set_cookie() {
        let jar = CookieJar::new();
        receive(
            &jar,
            "http://127.0.0.1:3000/api/auth/login",
            "access_token=abc123; Path=/; HttpOnly; SameSite=Lax",
        );
        assert_eq!(
            jar.access_token(&url("http://127.0.0.1:3000/")).as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn host_only_cookie_stays_on_its_host() {
        let jar = CookieJar::new();
        receive(&jar, "http://127.0.0.1:3000/", "access_token=secret; Path=/");
        assert!(jar.cookies(&url("http://127.0.0.1:3000/api/games")).is_some());
        assert!(jar.cookies(&url("http://localhost:3000/collect")).is_none());
        assert!(jar.cookies(&url("https://evil.example.com/")).is_none());
    }

    #[test]
    fn foreign_domain_attribute_is_rejected() {
        let jar = CookieJar::new();
        receive(&jar, "http://api.igame.test/", "access_token=x; Domain=other.test; Path=/");
        assert!(jar.is_empty());
    }

    #[test]
    fn secure_cookie_needs_https() {
        let jar = CookieJar::new();
        receive(&jar, "https://api.igame.test/", "access_token=x; Secure; Path=/");
        assert!(jar.cookies(&url("https://api.igame.test/")).is_some());
        assert!(jar.cookies(&url("http://api.igame.test/")).is_none());
    }

    #[test]
    fn path_attribute_limits_requests() {
        let jar = CookieJar::new();
        receive(&jar, "http://api.igame.test/api/auth/login", "scoped=1; Path=/api/auth");
        assert!(jar.get(&url("http://api.igame.test/api/auth/verify"), "scoped").is_some());
        assert!(jar.get(&url("http://api.igame.test/api/games"), "scoped").is_none());
    }

    #[test]
    fn max_age_zero_deletes() {
        let jar = CookieJar::new();
        let base = url("http://127.0.0.1:3000/");
        jar.insert(&base, ACCESS_TOKEN_COOKIE, "abc");
        receive(&jar, "http://127.0.0.1:3000/", "access_token=abc; Max-Age=0; Path=/");
        assert_eq!(jar.access_token(&base), None);
    }

    #[test]
    fn positive_max_age_beats_past_expires() {
        let jar = CookieJar::new();
        receive(
            &jar,
            "http://127.0.0.1:3000/",
            "access_token=abc; Max-Age=3600; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/",
        );
        assert_eq!(
            jar.access_token(&url("http://127.0.0.1:3000/")).as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn remove_only_touches_the_given_host() {
        let jar = CookieJar::new();
        let a = url("http://127.0.0.1:3000/");
        let b = url("http://localhost:3000/");
        jar.insert(&a, ACCESS_TOKEN_COOKIE, "one");
        jar.insert(&b, ACCESS_TOKEN_COOKIE, "two");
        assert_eq!(jar.remove(&a, ACCESS_TOKEN_COOKIE).as_deref(), Some("one"));
        assert_eq!(jar.access_token(&a), None);
        assert_eq!(jar.access_token(&b).as_deref(), Some("two"));
    }

    #[test]
    fn json_round_trip_keeps_session_cookies_and_scope() {
        let jar = CookieJar::new();
        let base = url("http://127.0.0.1:3000/");
        jar.insert(&base, ACCESS_TOKEN_COOKIE, "tok");

        let restored = CookieJar::from_json(&jar.to_json().unwrap()).unwrap();
        assert_eq!(restored.access_token(&base).as_deref(), Some("tok"));
        assert_eq!(restored.access_token(&url("http://localhost:3000/")), None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            CookieJar::from_json("not json"),
            Err(GatewayError::Cookies(_))
        ));
    }
}
