//! End-of-round summary.

use igame_api::EndGameResponse;
use igame_common::SessionParticipant;

pub const GAME_ENDED: &str = "Game ended successfully";
pub const NO_PARTICIPANTS: &str = "No participants in this game.";
pub const NO_WINNERS: &str = "No winners in this round.";

/// What the results screen shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsSummary {
    pub winning_number: Option<u8>,
    pub player_count: usize,
    pub winner_count: usize,
    pub winners: Vec<String>,
    pub starter: Option<String>,
    pub participants: Vec<String>,
}

fn names<'a>(it: impl Iterator<Item = &'a SessionParticipant>) -> Vec<String> {
    it.filter_map(|p| p.username()).map(str::to_string).collect()
}

impl From<&EndGameResponse> for ResultsSummary {
    fn from(res: &EndGameResponse) -> Self {
        let winners = names(res.participants.iter().filter(|p| p.is_winner));
        Self {
            winning_number: res.game.as_ref().and_then(|g| g.winning_number),
            player_count: res.participants.len(),
            winner_count: res.participants.iter().filter(|p| p.is_winner).count(),
            winners,
            starter: res
                .participants
                .iter()
                .find(|p| p.is_starter)
                .and_then(|p| p.username())
                .map(str::to_string),
            participants: names(res.participants.iter()),
        }
    }
}

impl ResultsSummary {
    /// Plain-text rendering used by the terminal front end.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        match self.winning_number {
            Some(n) => out.push(format!("Winning number: {n}")),
            None => out.push("Winning number: -".to_string()),
        }
        out.push(format!("Players: {}", self.player_count));
        out.push(format!("Winners: {}", self.winner_count));
        if let Some(starter) = &self.starter {
            out.push(format!("Started by: {starter}"));
        }

        if self.participants.is_empty() {
            out.push(NO_PARTICIPANTS.to_string());
        } else {
            out.push(format!("Participants: {}", self.participants.join(", ")));
        }
        if self.winners.is_empty() {
            out.push(NO_WINNERS.to_string());
        } else {
            out.push(format!("Winners list: {}", self.winners.join(", ")));
        }
        out
    }
}
