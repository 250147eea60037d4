//! One handler per CLI subcommand. Output goes to stdout; diagnostics go
//! through tracing.

use igame_common::Timeframe;
use igame_game::{
    guard, logout, AuthController, GuardDecision, LeaderboardController, LobbyController,
    LobbyEvent, LoginOutcome, RoomController, RoomEvent, Route, Screen,
};
use tracing::{debug, info};

use crate::boot::AppContext;
use crate::cli::Command;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Shown to the user as-is.
    #[error("{0}")]
    Failed(String),

    #[error("not logged in, run `igame login <username>` first")]
    NotLoggedIn,

    #[error("redirected to {0}")]
    Redirected(Route),
}

pub async fn run(ctx: &AppContext, command: Command) -> Result<(), CommandError> {
    match command {
        Command::Login {
            username,
            redirect_to,
        } => login(ctx, &username, redirect_to.as_deref()).await,
        Command::Logout => {
            let route = logout(&ctx.api, &ctx.cache).await;
            println!("Logged out.");
            debug!(to = %route, "navigate");
            Ok(())
        }
        Command::Whoami => whoami(ctx),
        Command::Leaderboard { timeframe } => leaderboard(ctx, timeframe).await,
        Command::Lobby { start } => lobby(ctx, start).await,
        Command::Play { number } => play(ctx, number.as_deref()).await,
        Command::Config => {
            println!("{}", igame_config::config_to_json(&ctx.config));
            Ok(())
        }
    }
}

async fn login(ctx: &AppContext, username: &str, redirect_to: Option<&str>) -> Result<(), CommandError> {
    if let GuardDecision::Redirect(to) = guard(&ctx.api, &ctx.config.api.base_url, "/auth").await {
        if let Some(user) = ctx.cache.get() {
            println!("Already logged in as {}.", user.username);
            debug!(to = %to, "navigate");
            return Ok(());
        }
    }

    let auth = AuthController::new(ctx.api.clone(), ctx.cache.clone());
    match auth.login(username, redirect_to).await {
        LoginOutcome::LoggedIn { user, navigate } => {
            println!(
                "Logged in as {} ({} wins, {} losses).",
                user.username, user.total_wins, user.total_losses
            );
            info!(to = %navigate, "navigate");
            Ok(())
        }
        LoginOutcome::Failed(message) => Err(CommandError::Failed(message)),
    }
}

fn whoami(ctx: &AppContext) -> Result<(), CommandError> {
    let user = ctx.cache.get().ok_or(CommandError::NotLoggedIn)?;
    println!(
        "{} ({} wins, {} losses)",
        user.username, user.total_wins, user.total_losses
    );
    Ok(())
}

async fn leaderboard(ctx: &AppContext, timeframe: Timeframe) -> Result<(), CommandError> {
    let mut board = LeaderboardController::new(ctx.api.clone());
    let lines = board.fetch(timeframe).await.map_err(CommandError::Failed)?;
    println!("Leaderboard ({})", timeframe.label());
    if lines.is_empty() {
        println!("No players yet.");
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn redirected(route: Route) -> CommandError {
    match route {
        Route::Auth { .. } => CommandError::NotLoggedIn,
        other => CommandError::Redirected(other),
    }
}

async fn lobby(ctx: &AppContext, start: bool) -> Result<(), CommandError> {
    let mut lobby = LobbyController::new(ctx.api.clone(), ctx.cache.clone(), ctx.realtime.clone());
    if let Some(route) = lobby.mount().await {
        return Err(redirected(route));
    }

    let state = lobby.state();
    if let Some(user) = &state.user {
        println!("Welcome, {}.", user.username);
    }
    match (&state.current_session, state.active_session) {
        (Some(session), true) => println!(
            "Session {} running, {}s left.",
            session.id,
            state.countdown.unwrap_or_default()
        ),
        _ => println!("No session running."),
    }

    if start {
        println!("{}", lobby.state().action_label());
        return match lobby.start_or_join().await {
            Some(Route::Game) => {
                println!("Joined. Run `igame play --number <1-9>` to pick your number.");
                Ok(())
            }
            Some(route) => Err(redirected(route)),
            None => Err(CommandError::Failed(
                lobby.state().error.clone().unwrap_or_default(),
            )),
        };
    }

    if !lobby.state().active_session {
        return Ok(());
    }
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = lobby.next_event() => match event {
                Some(LobbyEvent::Tick { .. }) => {
                    if let Some(left) = lobby.state().countdown {
                        println!("{left}s left");
                    }
                }
                Some(LobbyEvent::Expired { .. }) => {
                    println!("Session ended.");
                    break;
                }
                Some(LobbyEvent::SessionCreated(session)) => {
                    println!("New session {} started.", session.id);
                }
                Some(LobbyEvent::Realtime(status)) => debug!(%status, "realtime"),
                None => break,
            },
        }
    }
    lobby.unmount();
    Ok(())
}

async fn play(ctx: &AppContext, number: Option<&str>) -> Result<(), CommandError> {
    if let GuardDecision::Redirect(route) = guard(&ctx.api, &ctx.config.api.base_url, "/game").await {
        return Err(redirected(route));
    }

    let mut room = RoomController::new(ctx.api.clone(), ctx.cache.clone(), ctx.realtime.clone());
    if let Some(route) = room.mount().await {
        return Err(redirected(route));
    }
    if room.state().screen() == Screen::NoActiveSession {
        println!("No active game session. Start one with `igame lobby --start`.");
        return Ok(());
    }

    if let Some(input) = number {
        if room.state().in_game {
            println!(
                "You already picked {}.",
                room.state().lucky_number.unwrap_or_default()
            );
        } else {
            if let Some(route) = room.choose_number(input).await {
                return Err(redirected(route));
            }
            if let Some(error) = &room.state().error {
                return Err(CommandError::Failed(error.clone()));
            }
            if let Some(success) = &room.state().success {
                println!("{success}");
            }
        }
    } else if !room.state().in_game {
        println!("Pick a number with `igame play --number <1-9>`.");
    }

    if let Some(count) = room.state().count {
        println!("{count} player(s) in this session.");
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if let Some(route) = room.leave().await {
                    debug!(to = %route, "navigate");
                }
                if let Some(msg) = &room.state().success {
                    println!("{msg}");
                }
                break;
            }
            event = room.next_event() => match event {
                Some(RoomEvent::Tick { .. }) => {
                    if let Some(left) = room.state().countdown {
                        println!("{left}s left");
                    }
                }
                Some(RoomEvent::Expired { .. }) => {
                    if let Some(summary) = room.state().summary() {
                        if room.state().screen() == Screen::Results {
                            for line in summary.lines() {
                                println!("{line}");
                            }
                        } else {
                            println!("Game over. You did not pick a number this round.");
                        }
                    } else if let Some(error) = &room.state().error {
                        return Err(CommandError::Failed(error.clone()));
                    }
                    break;
                }
                Some(RoomEvent::ParticipantJoined | RoomEvent::ParticipantLeft) => {
                    if let Some(count) = room.state().count {
                        println!("{count} player(s) in this session.");
                    }
                }
                Some(RoomEvent::Realtime(status)) => debug!(%status, "realtime"),
                None => break,
            },
        }
    }
    room.unmount();
    Ok(())
}
