//! Game room: pick a number, watch the countdown, see the results.

use chrono::Utc;
use igame_api::{EndGameResponse, GameApi};
use igame_common::{validate_chosen_number, GameSession, SessionParticipant, User};
use igame_platform::UserCache;
use igame_realtime::{RealtimeClient, SubscribeStatus, SubscriptionHandle};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::auth::{self, unauthorized_redirect};
use crate::clock::{ClockHandle, ClockStart, SessionClock};
use crate::results::{ResultsSummary, GAME_ENDED};
use crate::route::Route;

pub const ROOM_CHANNEL: &str = "session_participants-channel";
pub const PARTICIPANTS_TABLE: &str = "session_participants";

const NUMBER_SELECTED: &str = "Your lucky number was selected successfully";
const LEFT_GAME: &str = "You left the game successfully.";

#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    Tick { clock: u64, remaining: u32 },
    Expired { clock: u64 },
    ParticipantJoined,
    ParticipantLeft,
    Realtime(SubscribeStatus),
}

/// Which screen the room shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    NoActiveSession,
    SelectNumber,
    Results,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomState {
    pub user: Option<User>,
    pub countdown: Option<u32>,
    pub searching: bool,
    pub current_session: Option<GameSession>,
    /// Players in the session; `None` until known.
    pub count: Option<u32>,
    pub participant: Option<SessionParticipant>,
    /// The player has picked a number.
    pub in_game: bool,
    pub game_ended: bool,
    pub ending_game: bool,
    pub active_session: bool,
    pub results: Option<EndGameResponse>,
    pub lucky_number: Option<u8>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub submitting: bool,
    pub leaving: bool,
}

impl RoomState {
    pub fn screen(&self) -> Screen {
        if self.searching {
            return Screen::Loading;
        }
        let joined_and_ended = self.in_game && self.game_ended;
        if self.participant.is_none() || (!self.active_session && !joined_and_ended) {
            return Screen::NoActiveSession;
        }
        if joined_and_ended && self.results.is_some() {
            return Screen::Results;
        }
        Screen::SelectNumber
    }

    pub fn summary(&self) -> Option<ResultsSummary> {
        self.results.as_ref().map(ResultsSummary::from)
    }
}

pub struct RoomController {
    api: GameApi,
    cache: UserCache,
    realtime: Option<RealtimeClient>,
    state: RoomState,
    events_tx: mpsc::UnboundedSender<RoomEvent>,
    events_rx: mpsc::UnboundedReceiver<RoomEvent>,
    clock: Option<ClockHandle>,
    clock_id: u64,
    subscription: Option<SubscriptionHandle>,
}

impl RoomController {
    pub fn new(api: GameApi, cache: UserCache, realtime: Option<RealtimeClient>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            cache,
            realtime,
            state: RoomState {
                searching: true,
                ..RoomState::default()
            },
            events_tx,
            events_rx,
            clock: None,
            clock_id: 0,
            subscription: None,
        }
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    /// Load the user and the running session, then follow joins and
    /// leaves. Returns a route when the room cannot be shown.
    pub async fn mount(&mut self) -> Option<Route> {
        match self.cache.get() {
            Some(user) => self.state.user = Some(user),
            None => {
                error!("No current user found, redirecting to auth");
                let route = auth::logout(&self.api, &self.cache).await;
                self.unmount();
                return Some(route);
            }
        }

        let fetched = self.api.active_game().await;
        self.state.searching = false;
        match fetched {
            Ok(active) => {
                debug!(has_game = active.game.is_some(), count = ?active.count, "Fetched active games");
                if let Some(game) = active.game {
                    self.state.count = active.count;
                    if let Some(participant) = active.participant {
                        if let Some(n) = participant.chosen_number {
                            self.state.in_game = true;
                            self.state.lucky_number = Some(n);
                        }
                        self.state.participant = Some(participant);
                    }
                    self.set_session(game);
                }
            }
            Err(e) => {
                if let Some(route) = unauthorized_redirect(&e, &self.api, &self.cache, &Route::Game) {
                    self.unmount();
                    return Some(route);
                }
                warn!("Failed to fetch active game: {e}");
            }
        }

        self.subscribe();
        None
    }

    fn subscribe(&mut self) {
        let Some(realtime) = &self.realtime else {
            debug!("realtime disabled, player count will not update");
            return;
        };
        let joined = self.events_tx.clone();
        let left = self.events_tx.clone();
        let statuses = self.events_tx.clone();
        let handle = realtime
            .channel(ROOM_CHANNEL)
            .on_insert(PARTICIPANTS_TABLE, move |_| {
                let _ = joined.send(RoomEvent::ParticipantJoined);
            })
            .on_delete(PARTICIPANTS_TABLE, move |_| {
                let _ = left.send(RoomEvent::ParticipantLeft);
            })
            .on_status(move |status| {
                let _ = statuses.send(RoomEvent::Realtime(status.clone()));
            })
            .subscribe();
        self.subscription = Some(handle);
    }

    fn set_session(&mut self, session: GameSession) {
        self.clock = None;
        self.clock_id += 1;
        let clock = self.clock_id;

        self.state.active_session = true;
        let ticks = self.events_tx.clone();
        let expiry = self.events_tx.clone();
        match SessionClock::start(
            &session,
            Utc::now(),
            move |remaining| {
                let _ = ticks.send(RoomEvent::Tick { clock, remaining });
            },
            move || {
                let _ = expiry.send(RoomEvent::Expired { clock });
            },
        ) {
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

    /// Wait for the next event and apply it. Expiry ends the game before
    /// this returns. `None` once unmounted.
    pub async fn next_event(&mut self) -> Option<RoomEvent> {
        let event = self.events_rx.recv().await?;
        self.apply(event.clone()).await;
        Some(event)
    }

    async fn apply(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::Tick { clock, remaining } if clock == self.clock_id => {
                self.state.countdown = Some(remaining);
            }
            RoomEvent::Expired { clock } if clock == self.clock_id => {
                self.state.countdown = Some(0);
                self.clock = None;
                self.end_game().await;
            }
            RoomEvent::Tick { .. } | RoomEvent::Expired { .. } => {}
            RoomEvent::ParticipantJoined => {
                self.state.count = Some(self.state.count.map_or(1, |c| c + 1));
            }
            RoomEvent::ParticipantLeft => {
                self.state.count = self.state.count.map(|c| c.saturating_sub(1));
            }
            RoomEvent::Realtime(status) => debug!(%status, "room channel status"),
        }
    }

    /// Submit the number typed by the player.
    pub async fn choose_number(&mut self, input: &str) -> Option<Route> {
        self.state.error = None;
        self.state.success = None;
        let number = match validate_chosen_number(input) {
            Ok(n) => n,
            Err(e) => {
                self.state.error = Some(e.to_string());
                return None;
            }
        };
        let Some(game_id) = self.state.current_session.as_ref().map(|s| s.id.clone()) else {
            self.state.error = Some("No active session".to_string());
            return None;
        };

        self.state.submitting = true;
        let result = self.api.set_number(&game_id, number).await;
        self.state.submitting = false;
        match result {
            Ok(_) => {
                info!(number, "lucky number selected");
                self.state.lucky_number = Some(number);
                self.state.in_game = true;
                self.state.success = Some(NUMBER_SELECTED.to_string());
                None
            }
            Err(e) => {
                if let Some(route) = unauthorized_redirect(&e, &self.api, &self.cache, &Route::Game) {
                    return Some(route);
                }
                error!("Failed to select number: {e}");
                self.state.error = Some(e.user_message("Failed to select number"));
                None
            }
        }
    }

    /// Leave the session; navigates home on success.
    pub async fn leave(&mut self) -> Option<Route> {
        self.state.error = None;
        self.state.success = None;
        let Some(game_id) = self.state.current_session.as_ref().map(|s| s.id.clone()) else {
            return Some(Route::Home);
        };

        self.state.leaving = true;
        let result = self.api.leave_game(&game_id).await;
        self.state.leaving = false;
        match result {
            Ok(()) => {
                info!(game_id = %game_id, "left game");
                self.state.success = Some(LEFT_GAME.to_string());
                self.unmount();
                Some(Route::Home)
            }
            Err(e) => {
                if let Some(route) = unauthorized_redirect(&e, &self.api, &self.cache, &Route::Game) {
                    return Some(route);
                }
                error!("Failed to leave game: {e}");
                self.state.error = Some(e.user_message("Failed to leave game"));
                None
            }
        }
    }

    /// Close the round and store the results. The cached user is replaced
    /// with this player's updated record.
    pub async fn end_game(&mut self) {
        let Some(game_id) = self.state.current_session.as_ref().map(|s| s.id.clone()) else {
            return;
        };
        self.state.ending_game = true;
        let result = self.api.end_game(&game_id).await;
        self.state.ending_game = false;

        match result {
            Ok(res) => {
                let username = self.state.user.as_ref().map(|u| u.username.clone());
                let updated = res
                    .participants
                    .iter()
                    .find(|p| p.username().is_some() && p.username() == username.as_deref())
                    .and_then(|p| p.user.clone());
                if let Some(user) = updated {
                    self.cache.set(&user);
                    self.state.user = Some(user);
                }
                self.state.active_session = false;
                self.state.game_ended = true;
                self.state.success = Some(GAME_ENDED.to_string());
                info!(game_id = %game_id, players = res.participants.len(), "game ended");
                self.state.results = Some(res);
            }
            Err(e) => {
                error!("Failed to end game: {e}");
                if unauthorized_redirect(&e, &self.api, &self.cache, &Route::Game).is_none() {
                    self.state.error = Some(e.user_message("Failed to end game"));
                }
            }
        }
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

impl Drop for RoomController {
    fn drop(&mut self) {
        self.unmount();
    }
}
