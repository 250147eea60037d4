//! Authenticated request gateway.
//!
//! Every backend call goes through [`AuthGateway::fetch_with_auth`]. It
//! resolves the target against the configured base URL, normalises the
//! method, and attaches credentials. Bodies are not interpreted here.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Url};
use tracing::debug;

use crate::cookies::CookieJar;
use crate::error::GatewayError;

/// Connection settings for the gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Per-request options. `method` is case-insensitive and defaults to GET.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self {
            method: Some("POST".into()),
            ..Self::default()
        }
    }

    pub fn post_json(body: serde_json::Value) -> Self {
        Self {
            body: Some(body),
            ..Self::post()
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Issues HTTP requests with the caller's credentials attached.
///
/// The cookie jar is supplied by the caller. A request carries only the
/// cookies its target host set, whether or not a bearer token is also given.
#[derive(Clone)]
pub struct AuthGateway {
    http: reqwest::Client,
    base_url: String,
    origin: Url,
    jar: Arc<CookieJar>,
}

impl AuthGateway {
    pub fn new(config: GatewayConfig, jar: Arc<CookieJar>) -> Result<Self, GatewayError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let origin = Url::parse(&base_url).map_err(|e| GatewayError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        if origin.cannot_be_a_base() {
            return Err(GatewayError::InvalidBaseUrl {
                url: base_url,
                reason: "not a hierarchical URL".into(),
            });
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| GatewayError::Build(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            origin,
            jar,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn jar(&self) -> &Arc<CookieJar> {
        &self.jar
    }

    /// Cookie `name` as the backend origin would receive it.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.jar.get(&self.origin, name)
    }

    /// Store a host-only cookie for the backend origin.
    pub fn set_cookie(&self, name: &str, value: &str) {
        self.jar.insert(&self.origin, name, value);
    }

    pub fn remove_cookie(&self, name: &str) -> Option<String> {
        self.jar.remove(&self.origin, name)
    }

    pub fn access_token(&self) -> Option<String> {
        self.jar.access_token(&self.origin)
    }

    /// Absolute `http(s)` targets pass through; anything else is a path
    /// under the base URL.
    pub fn resolve(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            return target.to_string();
        }
        if target.starts_with('/') {
            format!("{}{}", self.base_url, target)
        } else {
            format!("{}/{}", self.base_url, target)
        }
    }

    pub async fn fetch_with_auth(
        &self,
        target: &str,
        options: RequestOptions,
        token: Option<&str>,
    ) -> Result<reqwest::Response, GatewayError> {
        let method = normalize_method(options.method.as_deref())?;
        let url = self.resolve(target);

        let mut headers = HeaderMap::new();
        for (name, value) in &options.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| GatewayError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| GatewayError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                GatewayError::InvalidHeader {
                    name: AUTHORIZATION.to_string(),
                    reason: e.to_string(),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        debug!(%method, %url, bearer = token.is_some(), "backend request");

        let mut request = self.http.request(method, &url).headers(headers);
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Uppercase the method name, defaulting to GET.
pub fn normalize_method(method: Option<&str>) -> Result<Method, GatewayError> {
    let name = method
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("GET")
        .to_ascii_uppercase();
    Method::from_bytes(name.as_bytes()).map_err(|_| GatewayError::InvalidMethod(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(base: &str) -> AuthGateway {
        AuthGateway::new(GatewayConfig::new(base), Arc::new(CookieJar::new())).unwrap()
    }

    #[test]
    fn method_defaults_to_get() {
        assert_eq!(normalize_method(None).unwrap(), Method::GET);
        assert_eq!(normalize_method(Some("")).unwrap(), Method::GET);
    }

    #[test]
    fn method_is_uppercased() {
        assert_eq!(normalize_method(Some("post")).unwrap(), Method::POST);
        assert_eq!(normalize_method(Some("Delete")).unwrap(), Method::DELETE);
    }

    #[test]
    fn invalid_method_is_rejected() {
        assert!(matches!(
            normalize_method(Some("GE T")),
            Err(GatewayError::InvalidMethod(_))
        ));
    }

    #[test]
    fn resolves_relative_and_absolute_targets() {
        let gw = gateway("http://localhost:3000/");
        assert_eq!(
            gw.resolve("/api/games/active"),
            "http://localhost:3000/api/games/active"
        );
        assert_eq!(gw.resolve("api/auth/login"), "http://localhost:3000/api/auth/login");
        assert_eq!(
            gw.resolve("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn base_url_must_parse() {
        let err = AuthGateway::new(GatewayConfig::new("localhost:3000"), Arc::new(CookieJar::new()));
        assert!(matches!(err, Err(GatewayError::InvalidBaseUrl { .. })));
        let err = AuthGateway::new(GatewayConfig::new("not a url"), Arc::new(CookieJar::new()));
        assert!(matches!(err, Err(GatewayError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn cookie_helpers_use_the_backend_origin() {
        let gw = gateway("http://127.0.0.1:3000");
        gw.set_cookie("access_token", "tok");
        assert_eq!(gw.access_token().as_deref(), Some("tok"));
        let other = Url::parse("http://localhost:3000/").unwrap();
        assert_eq!(gw.jar().access_token(&other), None);
        assert_eq!(gw.remove_cookie("access_token").as_deref(), Some("tok"));
        assert!(gw.jar().is_empty());
    }

    #[test]
    fn request_options_builders() {
        let opts = RequestOptions::post_json(serde_json::json!({"game_id": 1}))
            .header("x-trace", "abc");
        assert_eq!(opts.method.as_deref(), Some("POST"));
        assert!(opts.body.is_some());
        assert_eq!(opts.headers, vec![("x-trace".to_string(), "abc".to_string())]);
    }
}
