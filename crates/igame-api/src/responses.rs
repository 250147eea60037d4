//! Wire shapes of backend responses.
//!
//! Every field is optional; the backend omits what does not apply and
//! reports failures through an `error` string.

use igame_common::{GameSession, LeaderboardEntry, SessionParticipant, User};
use serde::{Deserialize, Serialize};

/// Responses that may carry an application error message.
pub trait ErrorField {
    fn error_message(&self) -> Option<&str>;
}

macro_rules! impl_error_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ErrorField for $ty {
                fn error_message(&self) -> Option<&str> {
                    self.error.as_deref().filter(|e| !e.is_empty())
                }
            }
        )*
    };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// new-game, join-game and set-number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameResponse {
    #[serde(default)]
    pub game: Option<GameSession>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveGameResponse {
    #[serde(default)]
    pub game: Option<GameSession>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub participant: Option<SessionParticipant>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndGameResponse {
    #[serde(default)]
    pub participants: Vec<SessionParticipant>,
    #[serde(default)]
    pub game: Option<GameSession>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    #[serde(default)]
    pub players: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `/api/auth/verify`. The user payload is left loosely typed since only
/// its presence matters to the route guard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub user: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl_error_field!(
    ErrorBody,
    LoginResponse,
    GameResponse,
    ActiveGameResponse,
    EndGameResponse,
    LeaderboardResponse,
    VerifyResponse,
);
