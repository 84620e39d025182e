//! Operational API Integration Tests
//!
//! Drives the axum router directly (no socket) and checks status
//! codes, payloads, and the commands emitted toward the feed client.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::sync::mpsc;
use tower::ServiceExt;

use news_webhook_bridge::{
    ApiState, BridgeStats, ConnectionState, FeedCommand, SubscriptionRegistry, router,
};

struct TestApi {
    router: Router,
    stats: Arc<BridgeStats>,
    registry: Arc<SubscriptionRegistry>,
    commands: mpsc::Receiver<FeedCommand>,
}

fn setup() -> TestApi {
    let stats = Arc::new(BridgeStats::new());
    let registry = Arc::new(SubscriptionRegistry::new());
    let (command_tx, commands) = mpsc::channel(8);

    let state = Arc::new(ApiState::new(
        "test-0.0.1".to_string(),
        Arc::clone(&stats),
        Arc::clone(&registry),
        command_tx,
    ));

    TestApi {
        router: router(state),
        stats,
        registry,
        commands,
    }
}

async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn liveness_is_always_ok() {
    let api = setup();
    let (status, _) = send(&api.router, "GET", "/healthz").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn readiness_tracks_connection_state() {
    let api = setup();

    let (status, _) = send(&api.router, "GET", "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    api.stats.mark_connected();
    let (status, _) = send(&api.router, "GET", "/readyz").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_reflects_state() {
    let api = setup();

    let (status, body) = send(&api.router, "GET", "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");

    api.stats.set_state(ConnectionState::Connecting);
    let (status, body) = send(&api.router, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");

    api.stats.mark_connected();
    let (status, body) = send(&api.router, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["connection"], "connected");
}

#[tokio::test]
async fn stats_exposes_counters_and_symbols() {
    let api = setup();
    api.registry.add("aapl");
    api.stats.increment_received();
    api.stats.increment_sent();

    let (status, body) = send(&api.router, "GET", "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], "test-0.0.1");
    assert_eq!(body["received_count"], 1);
    assert_eq!(body["sent_count"], 1);
    assert_eq!(body["symbols"][0], "AAPL");
    assert!(body["connected_secs"].is_null());
}

#[tokio::test]
async fn add_symbol_normalizes_and_emits_command() {
    let mut api = setup();

    let (status, body) = send(&api.router, "POST", "/symbols/tsla").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "subscribed");
    assert_eq!(body["symbol"], "TSLA");

    assert_eq!(api.registry.list(), vec!["TSLA".to_string()]);
    assert_eq!(
        api.commands.recv().await,
        Some(FeedCommand::Subscribe("TSLA".to_string()))
    );
}

#[tokio::test]
async fn duplicate_symbol_conflicts() {
    let api = setup();
    api.registry.add("TSLA");

    let (status, body) = send(&api.router, "POST", "/symbols/tsla").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "already_subscribed");
    assert_eq!(api.registry.len(), 1);
}

#[tokio::test]
async fn full_registry_rejects_new_symbols() {
    let api = setup();
    for i in 0..api.registry.capacity() {
        api.registry.add(&format!("SYM{i}"));
    }

    let (status, body) = send(&api.router, "POST", "/symbols/OVER").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "limit_exceeded");
    assert_eq!(api.registry.len(), api.registry.capacity());
}

#[tokio::test]
async fn remove_symbol_emits_command() {
    let mut api = setup();
    api.registry.add("MSFT");

    let (status, body) = send(&api.router, "DELETE", "/symbols/msft").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unsubscribed");
    assert!(api.registry.list().is_empty());
    assert_eq!(
        api.commands.recv().await,
        Some(FeedCommand::Unsubscribe("MSFT".to_string()))
    );
}

#[tokio::test]
async fn remove_unknown_symbol_is_not_found() {
    let api = setup();

    let (status, body) = send(&api.router, "DELETE", "/symbols/GHOST").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "not_subscribed");
}

#[tokio::test]
async fn restart_emits_restart_command() {
    let mut api = setup();

    let (status, body) = send(&api.router, "POST", "/restart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "restarting");
    assert_eq!(api.commands.recv().await, Some(FeedCommand::Restart));
}

#[tokio::test]
async fn symbols_lists_in_subscription_order() {
    let api = setup();
    api.registry.add("MSFT");
    api.registry.add("AAPL");

    let (status, body) = send(&api.router, "GET", "/symbols").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbols"][0], "MSFT");
    assert_eq!(body["symbols"][1], "AAPL");
    assert_eq!(body["count"], 2);
    assert_eq!(body["capacity"], 50);
}
