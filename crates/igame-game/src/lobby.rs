//! Lobby: shows the running session, lets the player start or join one.

use chrono::Utc;
use igame_api::{GameApi, NewGame};
use igame_common::{GameSession, User};
use igame_platform::UserCache;
use igame_realtime::{RealtimeClient, SubscribeStatus, SubscriptionHandle};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::auth::{self, unauthorized_redirect};
use crate::clock::{ClockHandle, ClockStart, SessionClock};
use crate::route::Route;

pub const LOBBY_CHANNEL: &str = "games-session";
pub const GAME_SESSIONS_TABLE: &str = "game_sessions";

/// Something that happened while the lobby is mounted.
#[derive(Debug, Clone, PartialEq)]
pub enum LobbyEvent {
    /// Countdown moved; `clock` identifies which session clock sent it.
    Tick { clock: u64, remaining: u32 },
    Expired { clock: u64 },
    SessionCreated(GameSession),
    Realtime(SubscribeStatus),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LobbyState {
    pub user: Option<User>,
    pub current_session: Option<GameSession>,
    /// A session is running and can still be joined.
    pub active_session: bool,
    pub countdown: Option<u32>,
    pub error: Option<String>,
    pub searching: bool,
    pub starting: bool,
    pub joining: bool,
    pub logging_out: bool,
}

impl LobbyState {
    /// Label of the main button, as the view shows it.
    pub fn action_label(&self) -> &'static str {
        if self.searching {
            "Loading..."
        } else if self.active_session {
            if self.joining {
                "Joining..."
            } else {
                "Join"
            }
        } else if self.starting {
            "Starting Session..."
        } else {
            "Start Session"
        }
    }
}

pub struct LobbyController {
    api: GameApi,
    cache: UserCache,
    realtime: Option<RealtimeClient>,
    state: LobbyState,
    events_tx: mpsc::UnboundedSender<LobbyEvent>,
    events_rx: mpsc::UnboundedReceiver<LobbyEvent>,
    clock: Option<ClockHandle>,
    clock_id: u64,
    subscription: Option<SubscriptionHandle>,
}

impl LobbyController {
    pub fn new(api: GameApi, cache: UserCache, realtime: Option<RealtimeClient>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            cache,
            realtime,
            state: LobbyState {
                searching: true,
                ..LobbyState::default()
            },
            events_tx,
            events_rx,
            clock: None,
            clock_id: 0,
            subscription: None,
        }
    }

    pub fn state(&self) -> &LobbyState {
        &self.state
    }

    /// Load the user, fetch the running session and subscribe to new ones.
    ///
    /// Returns a route when the lobby cannot be shown.
    pub async fn mount(&mut self) -> Option<Route> {
        match self.cache.get() {
            Some(user) => self.state.user = Some(user),
            None => {
                error!("No current user found, redirecting to auth");
                return Some(self.logout().await);
            }
        }

        self.subscribe();

        let fetched = self.api.active_game().await;
        self.state.searching = false;
        match fetched {
            Ok(active) => {
                debug!(has_game = active.game.is_some(), "Fetched active games");
                if let Some(game) = active.game {
                    self.set_session(game);
                }
            }
            Err(e) => {
                if let Some(route) = unauthorized_redirect(&e, &self.api, &self.cache, &Route::Lobby) {
                    self.unmount();
                    return Some(route);
                }
                warn!("Failed to fetch active game: {e}");
            }
        }
        None
    }

    fn subscribe(&mut self) {
        let Some(realtime) = &self.realtime else {
            debug!("realtime disabled, lobby will not see new sessions");
            return;
        };
        let rows = self.events_tx.clone();
        let statuses = self.events_tx.clone();
        let handle = realtime
            .channel(LOBBY_CHANNEL)
            .on_insert(GAME_SESSIONS_TABLE, move |change| {
                match serde_json::from_value::<GameSession>(change.record.clone()) {
                    Ok(session) => {
                        let _ = rows.send(LobbyEvent::SessionCreated(session));
                    }
                    Err(e) => warn!(error = %e, "ignoring malformed game_sessions row"),
                }
            })
            .on_status(move |status| {
                let _ = statuses.send(LobbyEvent::Realtime(status.clone()));
            })
            .subscribe();
        self.subscription = Some(handle);
    }

    /// Replace the current session and restart the countdown for it.
    fn set_session(&mut self, session: GameSession) {
        self.clock = None;
        self.clock_id += 1;
        let clock = self.clock_id;

        self.state.active_session = true;
        let ticks = self.events_tx.clone();
        let expiry = self.events_tx.clone();
        let start = SessionClock::start(
            &session,
            Utc::now(),
            move |remaining| {
                let _ = ticks.send(LobbyEvent::Tick { clock, remaining });
            },
            move || {
                let _ = expiry.send(LobbyEvent::Expired { clock });
            },
        );
        match start {
            ClockStart::AlreadyEnded => {
                info!("Session already ended");
                self.state.active_session = false;
            }
            ClockStart::Running(handle) => {
                self.state.countdown = Some(handle.remaining());
                self.clock = Some(handle);
            }
        }
        self.state.current_session = Some(session);
    }

    /// Wait for the next event and apply it. `None` once unmounted.
    pub async fn next_event(&mut self) -> Option<LobbyEvent> {
        let event = self.events_rx.recv().await?;
        self.apply(event.clone());
        Some(event)
    }

    /// Apply every event already queued, without waiting.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, event: LobbyEvent) {
        match event {
            LobbyEvent::Tick { clock, remaining } if clock == self.clock_id => {
                self.state.countdown = Some(remaining);
            }
            LobbyEvent::Expired { clock } if clock == self.clock_id => {
                self.state.countdown = Some(0);
                self.state.active_session = false;
                self.clock = None;
            }
            LobbyEvent::Tick { .. } | LobbyEvent::Expired { .. } => {}
            LobbyEvent::SessionCreated(session) => {
                info!(game_id = %session.id, "new game session announced");
                self.set_session(session);
            }
            LobbyEvent::Realtime(status) => debug!(%status, "lobby channel status"),
        }
    }

    /// Start a session when none is known, otherwise join the current one.
    pub async fn start_or_join(&mut self) -> Option<Route> {
        self.state.error = None;
        match self.state.current_session.clone() {
            None => self.start().await,
            Some(session) => self.join(&session).await,
        }
    }

    async fn start(&mut self) -> Option<Route> {
        self.state.starting = true;
        let result = self.api.new_game().await;
        self.state.starting = false;
        match result {
            Ok(NewGame::Started(game)) => {
                info!(game_id = %game.id, "started new game session");
                Some(Route::Game)
            }
            Ok(NewGame::AlreadyActive { game, message }) => {
                error!("Failed to start new game session: {message}");
                self.state.error = Some(message);
                self.set_session(game);
                None
            }
            Err(e) => {
                if let Some(route) = unauthorized_redirect(&e, &self.api, &self.cache, &Route::Lobby) {
                    return Some(route);
                }
                error!("Error while starting new game session: {e}");
                self.state.error = Some(e.user_message("Error while starting new game session"));
                None
            }
        }
    }

    async fn join(&mut self, session: &GameSession) -> Option<Route> {
        self.state.joining = true;
        let result = self.api.join_game(&session.id).await;
        self.state.joining = false;
        match result {
            Ok(_) => Some(Route::Game),
            Err(e) => {
                if let Some(route) = unauthorized_redirect(&e, &self.api, &self.cache, &Route::Lobby) {
                    return Some(route);
                }
                error!("Failed to join the session: {e}");
                self.state.error = Some(e.user_message(
                    "An error occurred while joining the session, please try again later",
                ));
                None
            }
        }
    }

    /// Log out, forget the user and leave for the login page. Local state
    /// is cleared even when the backend call fails.
    pub async fn logout(&mut self) -> Route {
        self.state.logging_out = true;
        let route = auth::logout(&self.api, &self.cache).await;
        self.state.logging_out = false;
        self.unmount();
        route
    }

    /// Stop the countdown and the subscription. Events already queued are
    /// discarded, so [`Self::next_event`] yields `None` from here on.
    pub fn unmount(&mut self) {
        self.clock = None;
        self.subscription = None;
        self.events_rx.close();
        while self.events_rx.try_recv().is_ok() {}
    }
}

impl Drop for LobbyController {
    fn drop(&mut self) {
        self.unmount();
    }
}
