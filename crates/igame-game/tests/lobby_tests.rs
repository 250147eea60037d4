mod support;

use std::sync::atomic::Ordering;
use std::time::Duration;

use igame_game::{LobbyController, LobbyEvent, Route};
use igame_realtime::{ChangeEvent, ChannelMessage, RetryPolicy, RowChange};
use serde_json::json;
use support::{
    api, api_with_cookie, cache_with, counted_realtime, game_json, scripted_realtime, user,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_active(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/games/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_mount_without_user_logs_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let game_api = api_with_cookie(&server, "stale");
    let mut lobby = LobbyController::new(game_api.clone(), cache_with(None), None);

    assert_eq!(lobby.mount().await, Some(Route::auth()));
    assert!(game_api.gateway().access_token().is_none());
}

#[tokio::test]
async fn test_mount_adopts_running_session() {
    let server = MockServer::start().await;
    mock_active(&server, json!({"game": game_json(4, 20_500), "count": 2})).await;

    let ada = user("ada");
    let mut lobby = LobbyController::new(
        api(&server),
        cache_with(Some(&ada)),
        None,
    );
    assert_eq!(lobby.state().action_label(), "Loading...");
    assert_eq!(lobby.mount().await, None);

    let state = lobby.state();
    assert_eq!(state.user.as_ref(), Some(&ada));
    assert!(state.active_session);
    assert!(!state.searching);
    assert_eq!(state.countdown, Some(20));
    assert_eq!(state.action_label(), "Join");
    lobby.unmount();
}

#[tokio::test]
async fn test_start_without_session_navigates_to_game() {
    let server = MockServer::start().await;
    mock_active(&server, json!({})).await;
    Mock::given(method("POST"))
        .and(path("/api/games/new-game"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"game": game_json(9, 30_000)})))
        .expect(1)
        .mount(&server)
        .await;

    let mut lobby = LobbyController::new(
        api(&server),
        cache_with(Some(&user("ada"))),
        None,
    );
    lobby.mount().await;
    assert_eq!(lobby.state().action_label(), "Start Session");
    assert_eq!(lobby.start_or_join().await, Some(Route::Game));
    assert!(!lobby.state().starting);
}

#[tokio::test]
async fn test_refused_start_adopts_returned_game() {
    let server = MockServer::start().await;
    mock_active(&server, json!({})).await;
    Mock::given(method("POST"))
        .and(path("/api/games/new-game"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "game": game_json(5, 10_500),
            "error": "A game session is already active"
        })))
        .mount(&server)
        .await;

    let mut lobby = LobbyController::new(
        api(&server),
        cache_with(Some(&user("ada"))),
        None,
    );
    lobby.mount().await;
    assert_eq!(lobby.start_or_join().await, None);

    let state = lobby.state();
    assert_eq!(state.error.as_deref(), Some("A game session is already active"));
    assert_eq!(
        state.current_session.as_ref().map(|s| s.id.as_string()),
        Some("5".to_string())
    );
    assert!(state.active_session);
}

#[tokio::test]
async fn test_join_failure_shows_server_message() {
    let server = MockServer::start().await;
    mock_active(&server, json!({"game": game_json(6, 15_500)})).await;
    Mock::given(method("POST"))
        .and(path("/api/games/join-game"))
        .and(body_json(json!({"game_id": 6})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Session is full"})))
        .mount(&server)
        .await;

    let mut lobby = LobbyController::new(
        api(&server),
        cache_with(Some(&user("ada"))),
        None,
    );
    lobby.mount().await;
    assert_eq!(lobby.start_or_join().await, None);
    assert_eq!(lobby.state().error.as_deref(), Some("Session is full"));
    assert!(!lobby.state().joining);
}

#[tokio::test]
async fn test_invalid_token_redirects_to_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/games/active"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid token"})))
        .mount(&server)
        .await;

    let game_api = api_with_cookie(&server, "expired");
    let cache = cache_with(Some(&user("ada")));
    let mut lobby = LobbyController::new(game_api.clone(), cache.clone(), None);

    assert_eq!(
        lobby.mount().await,
        Some(Route::Auth {
            redirect_to: Some("/lobby".into())
        })
    );
    assert!(cache.get().is_none());
    assert!(game_api.gateway().access_token().is_none());
}

#[tokio::test]
async fn test_clock_expiry_closes_session() {
    let server = MockServer::start().await;
    mock_active(&server, json!({"game": game_json(7, 1_500)})).await;

    let mut lobby = LobbyController::new(
        api(&server),
        cache_with(Some(&user("ada"))),
        None,
    );
    lobby.mount().await;
    assert_eq!(lobby.state().countdown, Some(1));

    let event = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match lobby.next_event().await {
                Some(e @ LobbyEvent::Expired { .. }) => break e,
                Some(_) => continue,
                None => panic!("event queue closed"),
            }
        }
    })
    .await
    .unwrap();

    assert!(matches!(event, LobbyEvent::Expired { .. }));
    assert!(!lobby.state().active_session);
    assert_eq!(lobby.state().countdown, Some(0));
    assert_eq!(lobby.state().action_label(), "Start Session");
}

#[tokio::test]
async fn test_realtime_insert_replaces_session() {
    let server = MockServer::start().await;
    mock_active(&server, json!({"game": game_json(1, 3_500)})).await;

    let (realtime, feed) = scripted_realtime();
    let mut lobby = LobbyController::new(
        api(&server),
        cache_with(Some(&user("ada"))),
        Some(realtime),
    );
    lobby.mount().await;

    feed.send(ChannelMessage::Change(RowChange {
        event: ChangeEvent::Insert,
        schema: "public".into(),
        table: "game_sessions".into(),
        record: game_json(2, 25_500),
        old_record: serde_json::Value::Null,
        commit_timestamp: None,
    }))
    .await
    .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = lobby.next_event().await {
            if matches!(event, LobbyEvent::SessionCreated(_)) {
                break;
            }
        }
    })
    .await
    .unwrap();

    let state = lobby.state();
    assert_eq!(
        state.current_session.as_ref().map(|s| s.id.as_string()),
        Some("2".to_string())
    );
    assert_eq!(state.countdown, Some(25));
    assert!(state.active_session);
    lobby.unmount();
}

#[tokio::test]
async fn test_unmount_silences_clock_and_realtime() {
    let server = MockServer::start().await;
    mock_active(&server, json!({"game": game_json(4, 1_500)})).await;

    let retry = RetryPolicy::fixed(Duration::from_millis(100), None);
    let (realtime, feed, opens) = counted_realtime(retry);
    let mut lobby = LobbyController::new(
        api(&server),
        cache_with(Some(&user("ada"))),
        Some(realtime),
    );
    lobby.mount().await;
    assert_eq!(lobby.state().countdown, Some(1));
    tokio::time::timeout(Duration::from_secs(5), async {
        while opens.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    lobby.unmount();
    // A live subscription would now reconnect after 100ms.
    drop(feed);
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    let next = tokio::time::timeout(Duration::from_secs(1), lobby.next_event())
        .await
        .unwrap();
    assert!(next.is_none());
    assert_eq!(opens.load(Ordering::SeqCst), 1);
    assert_eq!(lobby.state().countdown, Some(1));
    assert!(lobby.state().active_session);
}
