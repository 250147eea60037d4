use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::id::GameId;

/// A player as known to the backend. Cached client-side between views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub total_wins: u32,
    #[serde(default)]
    pub total_losses: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Active,
    Finished,
}

/// A timed round with a single winning number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: GameId,
    pub status: GameStatus,
    pub created_at: DateTime<Utc>,
    /// Length of the round in seconds.
    pub session_duration: u32,
    #[serde(default)]
    pub winning_number: Option<u8>,
}

impl GameSession {
    /// The instant after which the session is considered ended locally.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::seconds(i64::from(self.session_duration))
    }

    /// Whole seconds left at `now`, floored. Negative once expired.
    pub fn seconds_left(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.expires_at() - now).num_milliseconds();
        millis.div_euclid(1000)
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.seconds_left(now) < 1
    }
}

/// A user's membership in a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionParticipant {
    #[serde(default)]
    pub id: Option<GameId>,
    #[serde(default)]
    pub session_id: Option<GameId>,
    #[serde(default)]
    pub user_id: Option<GameId>,
    #[serde(default)]
    pub chosen_number: Option<u8>,
    #[serde(default)]
    pub is_winner: bool,
    #[serde(default)]
    pub is_starter: bool,
    #[serde(default)]
    pub user: Option<User>,
}

impl SessionParticipant {
    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    #[serde(default)]
    pub total_wins: u32,
}

/// Leaderboard window, as used in `/api/games/leaderboard/:timeframe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Timeframe {
    #[default]
    AllTime,
    Today,
    Weekly,
    Monthly,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::AllTime,
        Timeframe::Today,
        Timeframe::Weekly,
        Timeframe::Monthly,
    ];

    pub fn as_path(&self) -> &'static str {
        match self {
            Self::AllTime => "all-time",
            Self::Today => "today",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AllTime => "All Time",
            Self::Today => "Today",
            Self::Weekly => "This Week",
            Self::Monthly => "This Month",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown timeframe '{0}' (expected all-time, today, weekly or monthly)")]
pub struct ParseTimeframeError(String);

impl FromStr for Timeframe {
    type Err = ParseTimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_path() == s)
            .ok_or_else(|| ParseTimeframeError(s.to_string()))
    }
}
