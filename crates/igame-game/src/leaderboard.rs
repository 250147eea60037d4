use igame_api::{ApiError, GameApi};
use igame_common::{LeaderboardEntry, Timeframe};
use tracing::{debug, error};

const FETCH_FAILED: &str = "Failed to fetch leaderboard";
const FETCH_ERRORED: &str = "An error occurred while fetching the leaderboard.";

/// `"{rank}. {username} - {wins} wins"`, ranks starting at 1.
pub fn format_entries(entries: &[LeaderboardEntry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{}. {} - {} wins", i + 1, e.username, e.total_wins))
        .collect()
}

/// Leaderboard view for one timeframe at a time.
#[derive(Debug, Clone)]
pub struct LeaderboardController {
    api: GameApi,
    timeframe: Timeframe,
    entries: Vec<LeaderboardEntry>,
    error: Option<String>,
}

impl LeaderboardController {
    pub fn new(api: GameApi) -> Self {
        Self {
            api,
            timeframe: Timeframe::default(),
            entries: Vec::new(),
            error: None,
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Load `timeframe` and return the ranked lines, or the inline error.
    pub async fn fetch(&mut self, timeframe: Timeframe) -> Result<Vec<String>, String> {
        self.timeframe = timeframe;
        self.error = None;
        match self.api.leaderboard(timeframe).await {
            Ok(entries) => {
                debug!(%timeframe, players = entries.len(), "leaderboard loaded");
                self.entries = entries;
                Ok(format_entries(&self.entries))
            }
            Err(e) => {
                error!("Error fetching leaderboard: {e}");
                self.entries.clear();
                let message = match &e {
                    ApiError::Network(_) | ApiError::Parse(_) => FETCH_ERRORED.to_string(),
                    other => other.user_message(FETCH_FAILED),
                };
                self.error = Some(message.clone());
                Err(message)
            }
        }
    }
}
