//! Journey: signing in and reading the account over real HTTP

use chrono::Duration;
use tsurukame_core::prelude::*;
use tsurukame_e2e_tests::{MockServer, TestDataFactory, MOCK_TOKEN};

#[tokio::test]
async fn test_fetch_user_over_http() {
    let server = MockServer::start(TestDataFactory::two_level_account())
        .await
        .unwrap();
    let client = server.client();
    let progress = FetchProgress::new();

    let user = client.user(&progress).await.unwrap();

    assert_eq!(user.username, "koichi");
    assert_eq!(user.level, 2);
    assert_eq!(user.current_level(), 2);
    assert!(user.subscribed);
    assert_eq!(user.started_at, Some(TestDataFactory::epoch()));
    assert_eq!(progress.completed_unit_count(), 1);

    let requests = server.requests_to("/v2/user");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some(format!("Token token={MOCK_TOKEN}").as_str())
    );

    let state = client.rate_limiter().snapshot();
    assert_eq!(state.requests_in_interval, 1);
    assert!(state.last_request_server_date.is_some());
}

#[tokio::test]
async fn test_free_account_is_capped() {
    let mut state = TestDataFactory::two_level_account();
    state.user = TestDataFactory::free_user("hana", 10);
    let server = MockServer::start(state).await.unwrap();

    let user = server.client().user(&FetchProgress::new()).await.unwrap();

    assert_eq!(user.level, 10);
    assert!(!user.subscribed);
    assert_eq!(user.current_level(), 3);
}

#[tokio::test]
async fn test_clock_skew_from_date_header() {
    let mut state = TestDataFactory::two_level_account();
    state.clock_offset = Duration::hours(2);
    let server = MockServer::start(state).await.unwrap();
    let client = server.client();

    client.user(&FetchProgress::new()).await.unwrap();

    // The header has one-second resolution
    let error = client.rate_limiter().clock_skew() - Duration::hours(2);
    assert!(
        error.num_milliseconds().abs() <= 2_000,
        "skew off by {}ms",
        error.num_milliseconds()
    );
}

#[tokio::test]
async fn test_token_rotation_mid_session() {
    let server = MockServer::start(TestDataFactory::two_level_account())
        .await
        .unwrap();
    let client = server.client();
    client.user(&FetchProgress::new()).await.unwrap();

    server.update(|state| state.token = "rotated".to_string());
    let err = client.user(&FetchProgress::new()).await.unwrap_err();
    assert!(err.is_unauthorized());

    client.update_api_token("rotated");
    let user = client.user(&FetchProgress::new()).await.unwrap();
    assert_eq!(user.username, "koichi");

    let last = server.requests().pop().unwrap();
    assert_eq!(last.authorization.as_deref(), Some("Token token=rotated"));
}
