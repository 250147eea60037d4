//! View controllers for the igame client.
//!
//! Each controller owns the state of one screen, calls the backend through
//! [`igame_api::GameApi`], and reports navigation as a [`Route`].

pub mod auth;
pub mod clock;
pub mod leaderboard;
pub mod lobby;
pub mod results;
pub mod room;
pub mod route;

pub use auth::{guard, logout, sanitize_redirect, AuthController, GuardDecision, LoginOutcome};
pub use clock::{ClockHandle, ClockStart, SessionClock};
pub use leaderboard::{format_entries, LeaderboardController};
pub use lobby::{LobbyController, LobbyEvent, LobbyState};
pub use results::ResultsSummary;
pub use room::{RoomController, RoomEvent, RoomState, Screen};
pub use route::Route;
