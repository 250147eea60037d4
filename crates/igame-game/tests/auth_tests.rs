mod support;

use igame_common::Timeframe;
use igame_game::{guard, AuthController, GuardDecision, LeaderboardController, LoginOutcome, Route};
use serde_json::json;
use support::{api, api_with_cookie, cache_with};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ORIGIN: &str = "https://igame.example";

async fn mock_verify(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/auth/verify"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_caches_user_and_follows_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "access_token=abc; Path=/; HttpOnly")
                .set_body_json(json!({"user": {"username": "ada", "total_wins": 1}})),
        )
        .mount(&server)
        .await;

    let game_api = api(&server);
    let cache = cache_with(None);
    let auth = AuthController::new(game_api.clone(), cache.clone());

    let outcome = auth.login("ada", Some("/game")).await;
    let LoginOutcome::LoggedIn { user, navigate } = outcome else {
        panic!("expected login to succeed");
    };
    assert_eq!(user.username, "ada");
    assert_eq!(navigate, Route::Game);
    assert_eq!(cache.get(), Some(user));
    assert_eq!(game_api.gateway().access_token().as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_login_without_path_redirect_goes_to_lobby() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": {"username": "ada"}})))
        .mount(&server)
        .await;

    let auth = AuthController::new(api(&server), cache_with(None));
    let outcome = auth.login("ada", Some("https://evil.example")).await;
    assert!(matches!(
        outcome,
        LoginOutcome::LoggedIn {
            navigate: Route::Lobby,
            ..
        }
    ));
}

#[tokio::test]
async fn test_login_rejects_short_name_without_request() {
    let server = MockServer::start().await;
    let auth = AuthController::new(api(&server), cache_with(None));

    assert_eq!(
        auth.login("  ", None).await,
        LoginOutcome::Failed("Input cannot be empty".into())
    );
    assert_eq!(
        auth.login("ab", None).await,
        LoginOutcome::Failed("Input must be at least 3 characters long".into())
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_failure_shows_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Username taken"})))
        .mount(&server)
        .await;

    let cache = cache_with(None);
    let auth = AuthController::new(api(&server), cache.clone());
    assert_eq!(
        auth.login("ada", None).await,
        LoginOutcome::Failed("Username taken".into())
    );
    assert!(cache.get().is_none());
}

#[tokio::test]
async fn test_guard_game_without_cookie_redirects() {
    let server = MockServer::start().await;
    let game_api = api(&server);

    assert_eq!(
        guard(&game_api, ORIGIN, "/game").await,
        GuardDecision::Redirect(Route::Auth {
            redirect_to: Some("/game".into())
        })
    );
    // No cookie means no verification round-trip.
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_guard_game_with_rejected_cookie_drops_it() {
    let server = MockServer::start().await;
    mock_verify(&server, 401, json!({"error": "Invalid token"})).await;

    let game_api = api_with_cookie(&server, "expired");

    assert!(matches!(
        guard(&game_api, ORIGIN, "/game").await,
        GuardDecision::Redirect(Route::Auth { .. })
    ));
    assert!(game_api.gateway().access_token().is_none());
}

#[tokio::test]
async fn test_guard_game_with_valid_cookie_allows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/verify"))
        .and(header("cookie", "access_token=good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": {"username": "ada"}})))
        .expect(1)
        .mount(&server)
        .await;

    let game_api = api_with_cookie(&server, "good");
    assert_eq!(guard(&game_api, ORIGIN, "/game").await, GuardDecision::Allow);
}

#[tokio::test]
async fn test_guard_auth_with_valid_cookie_follows_redirect() {
    let server = MockServer::start().await;
    mock_verify(&server, 200, json!({"user": {"username": "ada"}})).await;

    let game_api = api_with_cookie(&server, "good");

    assert_eq!(
        guard(&game_api, ORIGIN, "/auth?redirect_to=%2Flobby").await,
        GuardDecision::Redirect(Route::Lobby)
    );
    assert_eq!(
        guard(&game_api, ORIGIN, "/auth?redirect_to=https%3A%2F%2Fevil.example%2Flobby").await,
        GuardDecision::Redirect(Route::Game)
    );
    assert_eq!(
        guard(&game_api, ORIGIN, "/auth").await,
        GuardDecision::Redirect(Route::Game)
    );
}

#[tokio::test]
async fn test_guard_auth_with_null_user_stays_and_drops_cookie() {
    let server = MockServer::start().await;
    mock_verify(&server, 200, json!({"user": null})).await;

    let game_api = api_with_cookie(&server, "stale");

    assert_eq!(guard(&game_api, ORIGIN, "/auth").await, GuardDecision::Allow);
    assert!(game_api.gateway().access_token().is_none());
}

#[tokio::test]
async fn test_guard_ignores_other_paths() {
    let server = MockServer::start().await;
    let game_api = api(&server);
    assert_eq!(guard(&game_api, ORIGIN, "/").await, GuardDecision::Allow);
    assert_eq!(guard(&game_api, ORIGIN, "/lobby").await, GuardDecision::Allow);
}

#[tokio::test]
async fn test_leaderboard_lines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/games/leaderboard/weekly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "players": [
                {"username": "ada", "total_wins": 5},
                {"username": "bob", "total_wins": 2}
            ]
        })))
        .mount(&server)
        .await;

    let mut board = LeaderboardController::new(api(&server));
    let lines = board.fetch(Timeframe::Weekly).await.unwrap();
    assert_eq!(lines, vec!["1. ada - 5 wins", "2. bob - 2 wins"]);
    assert_eq!(board.timeframe(), Timeframe::Weekly);
    assert!(board.error().is_none());
}

#[tokio::test]
async fn test_leaderboard_error_is_inline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/games/leaderboard/all-time"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut board = LeaderboardController::new(api(&server));
    assert_eq!(
        board.fetch(Timeframe::AllTime).await,
        Err("Failed to fetch leaderboard".to_string())
    );
    assert_eq!(board.error(), Some("Failed to fetch leaderboard"));
    assert!(board.entries().is_empty());
}
