//! Typed calls for each backend endpoint.

use igame_common::validate::{NUMBER_MAX, NUMBER_MIN};
use igame_common::{
    validate_username, GameId, GameSession, LeaderboardEntry, SessionParticipant, Timeframe,
    User, ValidationError,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::cookies::ACCESS_TOKEN_COOKIE;
use crate::error::{is_invalid_token_message, ApiError};
use crate::gateway::{AuthGateway, RequestOptions};
use crate::responses::{
    ActiveGameResponse, EndGameResponse, ErrorBody, ErrorField, GameResponse,
    LeaderboardResponse, LoginResponse, VerifyResponse,
};

const LOGIN_FAILED: &str = "Login failed";
const ACTIVE_GAME_FAILED: &str = "Failed to fetch active game";
const NEW_GAME_FAILED: &str = "Failed to start new game session";
const JOIN_FAILED: &str = "Failed to join the session, please try again later";
const SET_NUMBER_FAILED: &str = "Failed to select number";
const LEAVE_FAILED: &str = "Failed to leave game";
const END_GAME_FAILED: &str = "Failed to end game";
const LEADERBOARD_FAILED: &str = "Failed to fetch leaderboard";
const LOGOUT_FAILED: &str = "Logout failed";

/// State of the caller with respect to the current session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveGame {
    pub game: Option<GameSession>,
    /// Participants joined so far. A zero count is reported as unknown.
    pub count: Option<u32>,
    pub participant: Option<SessionParticipant>,
}

/// Outcome of asking the backend to start a session.
#[derive(Debug, Clone, PartialEq)]
pub enum NewGame {
    Started(GameSession),
    /// The backend refused because a session is already running and
    /// returned that session instead.
    AlreadyActive { game: GameSession, message: String },
}

/// A decoded response together with its HTTP status.
struct Reply<T> {
    status: StatusCode,
    body: T,
}

impl<T: ErrorField> Reply<T> {
    /// Fail on a non-2xx status or an `error` field.
    fn into_body(self, default_message: &str) -> Result<T, ApiError> {
        if let Some(message) = self.body.error_message() {
            return Err(ApiError::Application {
                status: self.status.as_u16(),
                message: message.to_string(),
            });
        }
        if !self.status.is_success() {
            return Err(ApiError::Application {
                status: self.status.as_u16(),
                message: default_message.to_string(),
            });
        }
        Ok(self.body)
    }
}

fn missing(status: StatusCode, message: &str) -> ApiError {
    ApiError::Application {
        status: status.as_u16(),
        message: message.to_string(),
    }
}

/// Classify a non-2xx reply whose body may or may not be `{error}` JSON.
fn rejected(status: StatusCode, text: &str, default_message: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(text)
        .ok()
        .and_then(|b| b.error_message().map(str::to_string));
    let unauthorized = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN);
    let reason = message.as_deref().unwrap_or(text.trim());
    if unauthorized && is_invalid_token_message(reason) {
        return ApiError::Unauthorized(reason.to_string());
    }
    missing(status, message.as_deref().unwrap_or(default_message))
}

/// Backend client. Cheap to clone; clones share the cookie jar.
#[derive(Debug, Clone)]
pub struct GameApi {
    gateway: AuthGateway,
    token: Option<String>,
}

impl GameApi {
    pub fn new(gateway: AuthGateway) -> Self {
        Self {
            gateway,
            token: None,
        }
    }

    /// Send `token` as a bearer credential on every call.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    /// Whether an access token is held, as a bearer token or a cookie.
    pub fn has_credentials(&self) -> bool {
        self.token.is_some() || self.gateway.access_token().is_some()
    }

    /// Drop local credentials: the bearer token and the access cookie.
    pub fn clear_credentials(&mut self) {
        self.token = None;
        self.gateway.remove_cookie(ACCESS_TOKEN_COOKIE);
    }

    async fn send<T>(
        &self,
        target: &str,
        options: RequestOptions,
        default_message: &str,
    ) -> Result<Reply<T>, ApiError>
    where
        T: DeserializeOwned + ErrorField,
    {
        let response = self
            .gateway
            .fetch_with_auth(target, options, self.token.as_deref())
            .await?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let unauthorized = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN);
        let raw = if text.trim().is_empty() { "{}" } else { text.as_str() };

        match serde_json::from_str::<T>(raw) {
            Ok(body) => {
                if unauthorized {
                    let message = body.error_message().unwrap_or(text.as_str());
                    if is_invalid_token_message(message) {
                        warn!(path = target, %status, "backend rejected credentials");
                        return Err(ApiError::Unauthorized(message.to_string()));
                    }
                }
                Ok(Reply { status, body })
            }
            Err(e) if status.is_success() => {
                error!(path = target, error = %e, "unexpected response body");
                Err(ApiError::Parse(e.to_string()))
            }
            Err(_) => {
                if unauthorized && is_invalid_token_message(&text) {
                    return Err(ApiError::Unauthorized(text.trim().to_string()));
                }
                let message = serde_json::from_str::<ErrorBody>(raw)
                    .ok()
                    .and_then(|b| b.error_message().map(str::to_string))
                    .unwrap_or_else(|| default_message.to_string());
                Err(ApiError::Application {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    pub async fn login(&self, username: &str) -> Result<User, ApiError> {
        validate_username(username)?;
        let reply: Reply<LoginResponse> = self
            .send(
                "/api/auth/login",
                RequestOptions::post_json(json!({ "username": username })),
                LOGIN_FAILED,
            )
            .await?;
        let status = reply.status;
        let body = reply.into_body(LOGIN_FAILED)?;
        let user = body.user.ok_or_else(|| missing(status, LOGIN_FAILED))?;
        info!(username = %user.username, "logged in");
        Ok(user)
    }

    /// Ends the server session and drops the local access cookie. Any 2xx
    /// answer is success and its body is not read.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let response = self
            .gateway
            .fetch_with_auth("/api/auth/logout", RequestOptions::get(), self.token.as_deref())
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = rejected(status, &text, LOGOUT_FAILED);
            error!(%status, "logout refused: {err}");
            return Err(err);
        }
        self.gateway.remove_cookie(ACCESS_TOKEN_COOKIE);
        info!("logged out");
        Ok(())
    }

    /// Confirms the held credential. Any non-2xx answer is a failure.
    pub async fn verify(&self) -> Result<VerifyResponse, ApiError> {
        let response = self
            .gateway
            .fetch_with_auth("/api/auth/verify", RequestOptions::get(), self.token.as_deref())
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = format!("Failed to verify user. Status: {}", status.as_u16());
            error!("{message}");
            return Err(missing(status, &message));
        }
        response
            .json::<VerifyResponse>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    pub async fn active_game(&self) -> Result<ActiveGame, ApiError> {
        let body = self
            .send::<ActiveGameResponse>("/api/games/active", RequestOptions::get(), ACTIVE_GAME_FAILED)
            .await?
            .into_body(ACTIVE_GAME_FAILED)?;
        debug!(
            has_game = body.game.is_some(),
            count = ?body.count,
            "fetched active game"
        );
        Ok(ActiveGame {
            game: body.game,
            count: body.count.filter(|c| *c > 0),
            participant: body.participant,
        })
    }

    pub async fn new_game(&self) -> Result<NewGame, ApiError> {
        let reply: Reply<GameResponse> = self
            .send("/api/games/new-game", RequestOptions::post(), NEW_GAME_FAILED)
            .await?;
        let status = reply.status;
        let GameResponse { game, error } = reply.body;
        let error = error.filter(|e| !e.is_empty());

        match (game, error) {
            (Some(game), None) if status.is_success() => {
                info!(game_id = %game.id, "started new game session");
                Ok(NewGame::Started(game))
            }
            (Some(game), error) => {
                let message = error.unwrap_or_else(|| NEW_GAME_FAILED.to_string());
                warn!(game_id = %game.id, %message, "new game refused, session already running");
                Ok(NewGame::AlreadyActive { game, message })
            }
            (None, error) => Err(missing(status, error.as_deref().unwrap_or(NEW_GAME_FAILED))),
        }
    }

    pub async fn join_game(&self, game_id: &GameId) -> Result<GameSession, ApiError> {
        let reply: Reply<GameResponse> = self
            .send(
                "/api/games/join-game",
                RequestOptions::post_json(json!({ "game_id": game_id })),
                JOIN_FAILED,
            )
            .await?;
        let status = reply.status;
        let body = reply.into_body(JOIN_FAILED)?;
        body.game.ok_or_else(|| missing(status, JOIN_FAILED))
    }

    pub async fn set_number(&self, game_id: &GameId, number: u8) -> Result<GameSession, ApiError> {
        if !(NUMBER_MIN..=NUMBER_MAX).contains(&number) {
            return Err(ValidationError::NumberOutOfRange.into());
        }
        let reply: Reply<GameResponse> = self
            .send(
                "/api/games/set-number",
                RequestOptions::post_json(json!({
                    "chosen_number": number,
                    "game_id": game_id,
                })),
                SET_NUMBER_FAILED,
            )
            .await?;
        let status = reply.status;
        let body = reply.into_body(SET_NUMBER_FAILED)?;
        body.game.ok_or_else(|| missing(status, SET_NUMBER_FAILED))
    }

    pub async fn leave_game(&self, game_id: &GameId) -> Result<(), ApiError> {
        self.send::<ErrorBody>(
            "/api/games/leave-game",
            RequestOptions::post_json(json!({ "game_id": game_id })),
            LEAVE_FAILED,
        )
        .await?
        .into_body(LEAVE_FAILED)?;
        Ok(())
    }

    pub async fn end_game(&self, game_id: &GameId) -> Result<EndGameResponse, ApiError> {
        self.send::<EndGameResponse>(
            "/api/games/end-game",
            RequestOptions::post_json(json!({ "game_id": game_id })),
            END_GAME_FAILED,
        )
        .await?
        .into_body(END_GAME_FAILED)
    }

    pub async fn leaderboard(&self, timeframe: Timeframe) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let target = format!("/api/games/leaderboard/{}", timeframe.as_path());
        let body = self
            .send::<LeaderboardResponse>(&target, RequestOptions::get(), LEADERBOARD_FAILED)
            .await?
            .into_body(LEADERBOARD_FAILED)?;
        Ok(body.players)
    }
}
