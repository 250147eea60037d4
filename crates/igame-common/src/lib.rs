pub mod errors;
pub mod id;
pub mod types;
pub mod validate;

pub use errors::{ConfigError, IgameError, PlatformError};
pub use id::GameId;
pub use types::{
    GameSession, GameStatus, LeaderboardEntry, ParseTimeframeError, SessionParticipant,
    Timeframe, User,
};
pub use validate::{validate_chosen_number, validate_username, ValidationError};

pub type Result<T> = std::result::Result<T, IgameError>;
