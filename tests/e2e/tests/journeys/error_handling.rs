//! Journey: the ways a session can go wrong

use tsurukame_core::prelude::*;
use tsurukame_core::ConfigError;
use tsurukame_e2e_tests::{MockServer, TestDataFactory};

#[tokio::test]
async fn test_rejected_token() {
    let server = MockServer::start(TestDataFactory::two_level_account())
        .await
        .unwrap();
    let config = server.config().with_token("not-my-token");
    let client = WaniKaniClient::connect(&config).unwrap();

    let err = client.user(&FetchProgress::new()).await.unwrap_err();

    assert!(err.is_unauthorized());
    match err {
        ApiError::Api { code, message, url, .. } => {
            assert_eq!(code, 401);
            assert_eq!(message.as_deref(), Some("Unauthorized. Nice try."));
            assert!(url.ends_with("/v2/user"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limited_response() {
    let mut state = TestDataFactory::two_level_account();
    state.failing_paths.insert("/v2/assignments".to_string(), 429);
    let server = MockServer::start(state).await.unwrap();

    let err = server
        .client()
        .assignments(&FetchProgress::new(), None, &std::collections::BTreeMap::<i64, i32>::new())
        .await
        .unwrap_err();

    assert!(err.is_rate_limited());
    assert!(matches!(err, ApiError::Api { status: 429, .. }));
}

#[tokio::test]
async fn test_server_error_fails_speculative_fetch() {
    let mut state = TestDataFactory::two_level_account();
    state.failing_paths.insert("/v2/subjects".to_string(), 503);
    let server = MockServer::start(state).await.unwrap();
    let progress = FetchProgress::new();

    let err = server
        .client()
        .subjects(&progress, None)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 503, .. }));
    assert_eq!(progress.completed_unit_count(), 0);
}

#[tokio::test]
async fn test_unreachable_server() {
    // Grab a free port, then release it so nothing is listening
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = ClientConfig::default()
        .with_token("token")
        .with_base_url(&format!("http://127.0.0.1:{port}/v2"))
        .unwrap();
    let client = WaniKaniClient::connect(&config).unwrap();

    let err = client.user(&FetchProgress::new()).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.status(), None);
}

#[test]
fn test_missing_token() {
    let config = ClientConfig::default()
        .with_base_url("http://127.0.0.1:1/v2")
        .unwrap();
    let err = WaniKaniClient::connect(&config).err().unwrap();
    assert!(matches!(err, ConfigError::MissingToken));
}
