//! Navigation targets returned by controllers.

use std::fmt;

use igame_api::Url;

/// Where the front end should go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`, the leaderboard.
    Home,
    /// `/auth`, optionally returning to `redirect_to` after login.
    Auth { redirect_to: Option<String> },
    Lobby,
    Game,
    /// Any other same-origin path.
    Other(String),
}

/// Base used to parse bare paths.
const LOCAL_ORIGIN: &str = "http://localhost/";

impl Route {
    pub fn auth() -> Self {
        Self::Auth { redirect_to: None }
    }

    /// Map a path (optionally with a query) to a route.
    pub fn from_path(path: &str) -> Self {
        let Ok(url) = Url::parse(LOCAL_ORIGIN).and_then(|base| base.join(path)) else {
            return Self::Other(path.to_string());
        };
        match url.path().trim_end_matches('/') {
            "" => Self::Home,
            "/lobby" => Self::Lobby,
            "/game" => Self::Game,
            "/auth" => {
                let redirect_to = url
                    .query_pairs()
                    .find(|(k, _)| k == "redirect_to")
                    .map(|(_, v)| v.into_owned())
                    .filter(|v| !v.is_empty());
                Self::Auth { redirect_to }
            }
            _ => Self::Other(path.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Auth { redirect_to: None } => "/auth".to_string(),
            Self::Auth {
                redirect_to: Some(to),
            } => match Url::parse(LOCAL_ORIGIN).and_then(|base| base.join("/auth")) {
                Ok(mut url) => {
                    url.query_pairs_mut().append_pair("redirect_to", to);
                    format!("{}?{}", url.path(), url.query().unwrap_or_default())
                }
                Err(_) => "/auth".to_string(),
            },
            Self::Lobby => "/lobby".to_string(),
            Self::Game => "/game".to_string(),
            Self::Other(path) => path.clone(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
