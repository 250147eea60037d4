//! Login and the route guard.

use igame_api::{ApiError, GameApi, Url, ACCESS_TOKEN_COOKIE};
use igame_common::{validate_username, User};
use igame_platform::UserCache;
use tracing::{error, info};

use crate::route::Route;

/// Outcome of a login attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    LoggedIn { user: User, navigate: Route },
    /// Shown inline; the view stays on the form.
    Failed(String),
}

/// Drives the login form.
#[derive(Debug, Clone)]
pub struct AuthController {
    api: GameApi,
    cache: UserCache,
}

impl AuthController {
    pub fn new(api: GameApi, cache: UserCache) -> Self {
        Self { api, cache }
    }

    /// Validate `username`, log in, and cache the user.
    ///
    /// On success navigates to `redirect_to` when it is a path, otherwise
    /// to the lobby.
    pub async fn login(&self, username: &str, redirect_to: Option<&str>) -> LoginOutcome {
        info!("Submitting login form");
        if let Err(e) = validate_username(username) {
            error!("{e}");
            return LoginOutcome::Failed(e.to_string());
        }

        match self.api.login(username).await {
            Ok(user) => {
                self.cache.set(&user);
                let navigate = match redirect_to {
                    Some(to) if to.starts_with('/') => Route::from_path(to),
                    _ => Route::Lobby,
                };
                info!(username = %user.username, to = %navigate, "Login successful");
                LoginOutcome::LoggedIn { user, navigate }
            }
            Err(e) => {
                error!("Login failed: {e}");
                LoginOutcome::Failed(e.user_message("Login failed"))
            }
        }
    }
}

/// Resolve `redirect_to` against `origin` and keep its path only when it
/// stays on the same origin.
pub fn sanitize_redirect(origin: &str, redirect_to: &str) -> Option<String> {
    let origin = Url::parse(origin).ok()?;
    let target = origin.join(redirect_to).ok()?;
    if target.origin() != origin.origin() {
        return None;
    }
    let path = target.path();
    path.starts_with('/').then(|| path.to_string())
}

/// What the guard decided for a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Route),
}

/// Gate for `/game` and `/auth` paths, keyed on the access credential.
///
/// - `/game…` without a verified credential redirects to
///   `/auth?redirect_to=<path>` and drops the cookie.
/// - `/auth…` with a verified credential redirects to the sanitised
///   `redirect_to`, or `/game`; with a rejected one the cookie is dropped.
pub async fn guard(api: &GameApi, origin: &str, path: &str) -> GuardDecision {
    let (pathname, _) = path.split_once('?').unwrap_or((path, ""));
    let has_token = api.has_credentials();

    if pathname.starts_with("/game") {
        if has_token && verify(api).await {
            return GuardDecision::Allow;
        }
        api.gateway().remove_cookie(ACCESS_TOKEN_COOKIE);
        return GuardDecision::Redirect(Route::Auth {
            redirect_to: Some(pathname.to_string()),
        });
    }

    if pathname.starts_with("/auth") && has_token {
        if verify(api).await {
            let target = match Route::from_path(path) {
                Route::Auth {
                    redirect_to: Some(to),
                } => sanitize_redirect(origin, &to),
                _ => None,
            };
            return GuardDecision::Redirect(
                target.map_or(Route::Game, |p| Route::from_path(&p)),
            );
        }
        api.gateway().remove_cookie(ACCESS_TOKEN_COOKIE);
    }

    GuardDecision::Allow
}

async fn verify(api: &GameApi) -> bool {
    match api.verify().await {
        Ok(res) if res.user.as_ref().is_some_and(|u| !u.is_null()) => true,
        Ok(_) => {
            error!("User verification failed: no user");
            false
        }
        Err(e) => {
            error!("User verification failed: {e}");
            false
        }
    }
}

/// Log out on the backend and forget the local session either way.
pub async fn logout(api: &GameApi, cache: &UserCache) -> Route {
    match api.logout().await {
        Ok(()) => info!("Logout successful"),
        Err(e) => error!("Logout failed: {e}"),
    }
    forget_session(api, cache);
    Route::auth()
}

/// Drop every trace of the session after the backend rejected it.
pub(crate) fn forget_session(api: &GameApi, cache: &UserCache) {
    cache.remove();
    api.gateway().remove_cookie(ACCESS_TOKEN_COOKIE);
}

/// The redirect for an `Unauthorized` error raised while on `from`.
pub(crate) fn unauthorized_redirect(
    err: &ApiError,
    api: &GameApi,
    cache: &UserCache,
    from: &Route,
) -> Option<Route> {
    if !err.is_unauthorized() {
        return None;
    }
    forget_session(api, cache);
    Some(Route::Auth {
        redirect_to: Some(from.path()),
    })
}
