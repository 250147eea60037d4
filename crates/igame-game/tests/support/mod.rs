//! Shared fixtures for controller tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use igame_api::{AuthGateway, CookieJar, GameApi, GatewayConfig};
use igame_common::User;
use igame_platform::{MemoryStorage, UserCache};
use igame_realtime::{
    ChannelConnector, ChannelMessage, ChannelSpec, ChannelStream, RealtimeClient, RealtimeError,
    RetryPolicy,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use wiremock::MockServer;

pub fn api(server: &MockServer) -> GameApi {
    let gw = AuthGateway::new(GatewayConfig::new(server.uri()), Arc::new(CookieJar::new())).unwrap();
    GameApi::new(gw)
}

/// An API client that already holds an `access_token` cookie for `server`.
pub fn api_with_cookie(server: &MockServer, token: &str) -> GameApi {
    let api = api(server);
    api.gateway().set_cookie(igame_api::ACCESS_TOKEN_COOKIE, token);
    api
}

pub fn user(name: &str) -> User {
    User {
        username: name.into(),
        total_wins: 0,
        total_losses: 0,
    }
}

pub fn cache_with(user: Option<&User>) -> UserCache {
    let cache = UserCache::new(Arc::new(MemoryStorage::new()));
    if let Some(u) = user {
        cache.set(u);
    }
    cache
}

/// A session JSON that has `left_ms` milliseconds to run.
pub fn game_json(id: i64, left_ms: i64) -> Value {
    let duration = 30;
    let created = Utc::now() - Duration::milliseconds(duration * 1000 - left_ms);
    json!({
        "id": id,
        "status": "active",
        "created_at": created.to_rfc3339(),
        "session_duration": duration,
        "winning_number": null
    })
}

/// Hands out pre-arranged streams, one per `open`, and counts every attempt.
pub struct ScriptedConnector {
    script: Mutex<VecDeque<mpsc::Receiver<ChannelMessage>>>,
    opens: Arc<AtomicUsize>,
}

#[async_trait]
impl ChannelConnector for ScriptedConnector {
    async fn open(&self, _spec: &ChannelSpec) -> Result<ChannelStream, RealtimeError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(rx) => Ok(ChannelStream::from_receiver(rx)),
            None => Err(RealtimeError::Connect("no more scripted streams".into())),
        }
    }
}

/// A realtime client whose single channel is fed through the returned sender.
pub fn scripted_realtime() -> (RealtimeClient, mpsc::Sender<ChannelMessage>) {
    let (client, tx, _) = counted_realtime(RetryPolicy::never());
    (client, tx)
}

/// Like [`scripted_realtime`], also returning the number of `open` calls.
pub fn counted_realtime(
    policy: RetryPolicy,
) -> (RealtimeClient, mpsc::Sender<ChannelMessage>, Arc<AtomicUsize>) {
    let (tx, rx) = mpsc::channel(16);
    let opens = Arc::new(AtomicUsize::new(0));
    let connector = ScriptedConnector {
        script: Mutex::new(VecDeque::from([rx])),
        opens: Arc::clone(&opens),
    };
    let client = RealtimeClient::with_connector(Arc::new(connector), policy);
    (client, tx, opens)
}
