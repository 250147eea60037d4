use std::path::PathBuf;

use clap::{Parser, Subcommand};
use igame_common::Timeframe;

/// iGame: a terminal client for the lucky-number game.
#[derive(Parser, Debug)]
#[command(name = "igame", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter override, e.g. `igame=debug`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Access token sent as a bearer credential instead of the cookie.
    #[arg(long)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Log in and remember the session.
    Login {
        username: String,
        /// Path to continue to after logging in.
        #[arg(long)]
        redirect_to: Option<String>,
    },
    /// End the session and forget the cached user.
    Logout,
    /// Print the cached user.
    Whoami,
    /// Show the top players.
    Leaderboard {
        #[arg(long, default_value = "all-time")]
        timeframe: Timeframe,
    },
    /// Show the running session and its countdown.
    Lobby {
        /// Start a session, or join the running one.
        #[arg(long)]
        start: bool,
    },
    /// Enter the game room and wait for the results.
    Play {
        /// Lucky number to pick (1-9).
        #[arg(long)]
        number: Option<String>,
    },
    /// Print the effective config as JSON.
    Config,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_before_command() {
        let args = Args::try_parse_from([
            "igame",
            "--config",
            "/tmp/igame.toml",
            "--log-level",
            "igame=debug",
            "whoami",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/igame.toml")));
        assert_eq!(args.log_level.as_deref(), Some("igame=debug"));
        assert_eq!(args.command, Command::Whoami);
    }

    #[test]
    fn login_takes_username_and_redirect() {
        let args =
            Args::try_parse_from(["igame", "login", "ada", "--redirect-to", "/game"]).unwrap();
        assert_eq!(
            args.command,
            Command::Login {
                username: "ada".into(),
                redirect_to: Some("/game".into()),
            }
        );
    }

    #[test]
    fn leaderboard_timeframe_defaults_to_all_time() {
        let args = Args::try_parse_from(["igame", "leaderboard"]).unwrap();
        assert_eq!(
            args.command,
            Command::Leaderboard {
                timeframe: Timeframe::AllTime
            }
        );
        let args = Args::try_parse_from(["igame", "leaderboard", "--timeframe", "weekly"]).unwrap();
        assert_eq!(
            args.command,
            Command::Leaderboard {
                timeframe: Timeframe::Weekly
            }
        );
        assert!(Args::try_parse_from(["igame", "leaderboard", "--timeframe", "yearly"]).is_err());
    }

    #[test]
    fn play_and_lobby_flags() {
        let args = Args::try_parse_from(["igame", "play", "--number", "7"]).unwrap();
        assert_eq!(
            args.command,
            Command::Play {
                number: Some("7".into())
            }
        );
        let args = Args::try_parse_from(["igame", "lobby", "--start"]).unwrap();
        assert_eq!(args.command, Command::Lobby { start: true });
    }

    #[test]
    fn command_is_required() {
        assert!(Args::try_parse_from(["igame"]).is_err());
    }
}
