//! Operational HTTP API
//!
//! HTTP surface for health checks, status reporting, runtime
//! subscription management, and manual restarts. Used by container
//! orchestrators, monitoring systems, and operators.
//!
//! # Endpoints
//!
//! - `GET /health` - JSON health status
//! - `GET /healthz` - Kubernetes liveness probe (simple OK)
//! - `GET /readyz` - Kubernetes readiness probe (feed connected?)
//! - `GET /stats` - Full statistics snapshot
//! - `GET /symbols` - Current subscription list
//! - `POST /symbols/{symbol}` - Subscribe to a topic
//! - `DELETE /symbols/{symbol}` - Unsubscribe from a topic
//! - `POST /restart` - Tear down and re-arm the feed connection
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::registry::{AddOutcome, RemoveOutcome, SubscriptionRegistry};
use crate::infrastructure::feed::FeedCommand;
use crate::infrastructure::metrics::get_metrics_handle;
use crate::infrastructure::stats::{BridgeStats, ConnectionState, StatsSnapshot};

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", or "unhealthy".
    pub status: HealthStatus,
    /// Bridge version.
    pub version: String,
    /// Process uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Feed connection state.
    pub connection: ConnectionState,
    /// Reconnect attempts since the last successful connect.
    pub reconnect_attempts: u32,
    /// Number of subscribed topics.
    pub subscriptions: usize,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Feed connected and forwarding.
    Healthy,
    /// Feed connection in progress.
    Degraded,
    /// Feed disconnected.
    Unhealthy,
}

/// Statistics response.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Bridge version.
    pub version: String,
    /// Process uptime in seconds.
    pub uptime_secs: u64,
    /// Seconds since the current connection was established.
    pub connected_secs: Option<u64>,
    /// Subscribed topics, in subscription order.
    pub symbols: Vec<String>,
    /// Counter snapshot.
    #[serde(flatten)]
    pub stats: StatsSnapshot,
}

/// Subscription list response.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolsResponse {
    /// Subscribed topics, in subscription order.
    pub symbols: Vec<String>,
    /// Current topic count.
    pub count: usize,
    /// Maximum topic count.
    pub capacity: usize,
}

/// Response for a symbol mutation.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolActionResponse {
    /// Action result: "subscribed", "unsubscribed", or an error word.
    pub status: &'static str,
    /// The normalized topic.
    pub symbol: String,
}

// =============================================================================
// API Server State
// =============================================================================

/// Shared state for the operational API.
pub struct ApiState {
    version: String,
    started_at: Instant,
    stats: Arc<BridgeStats>,
    registry: Arc<SubscriptionRegistry>,
    commands: mpsc::Sender<FeedCommand>,
}

impl ApiState {
    /// Create new API state.
    #[must_use]
    pub fn new(
        version: String,
        stats: Arc<BridgeStats>,
        registry: Arc<SubscriptionRegistry>,
        commands: mpsc::Sender<FeedCommand>,
    ) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            stats,
            registry,
            commands,
        }
    }
}

// =============================================================================
// API Server
// =============================================================================

/// Operational HTTP server.
pub struct ApiServer {
    port: u16,
    state: Arc<ApiState>,
    cancel: CancellationToken,
}

impl ApiServer {
    /// Create a new API server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<ApiState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the API server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ApiServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), ApiServerError> {
        let app = router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "Operational API listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| ApiServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Operational API stopped");
        Ok(())
    }
}

/// Build the API router. Exposed separately so tests can drive it
/// without binding a socket.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/stats", get(stats_handler))
        .route("/symbols", get(symbols_handler))
        .route(
            "/symbols/{symbol}",
            post(add_symbol_handler).delete(remove_symbol_handler),
        )
        .route("/restart", post(restart_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let connection = state.stats.state();
    let status = match connection {
        ConnectionState::Connected => HealthStatus::Healthy,
        ConnectionState::Connecting => HealthStatus::Degraded,
        ConnectionState::Disconnected | ConnectionState::Closing => HealthStatus::Unhealthy,
    };
    let status_code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        connection,
        reconnect_attempts: state.stats.reconnect_attempts(),
        subscriptions: state.registry.len(),
    };

    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    if state.stats.state() == ConnectionState::Connected {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn stats_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let stats = state.stats.snapshot();
    let connected_secs = stats
        .connected_since
        .map(|since| u64::try_from((Utc::now() - since).num_seconds().max(0)).unwrap_or(0));

    Json(StatsResponse {
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        connected_secs,
        symbols: state.registry.list(),
        stats,
    })
}

async fn symbols_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(SymbolsResponse {
        symbols: state.registry.list(),
        count: state.registry.len(),
        capacity: state.registry.capacity(),
    })
}

async fn add_symbol_handler(
    State(state): State<Arc<ApiState>>,
    Path(symbol): Path<String>,
) -> impl IntoResponse {
    let normalized = SubscriptionRegistry::normalize(&symbol);

    match state.registry.add(&symbol) {
        AddOutcome::Added => {
            // Best effort: while disconnected the command is consumed
            // and dropped; the topic is replayed on reconnect anyway.
            if let Err(e) = state
                .commands
                .send(FeedCommand::Subscribe(normalized.clone()))
                .await
            {
                tracing::warn!(symbol = %normalized, error = %e, "Subscribe command not delivered");
            }
            tracing::info!(symbol = %normalized, "Symbol subscribed");
            (
                StatusCode::OK,
                Json(SymbolActionResponse {
                    status: "subscribed",
                    symbol: normalized,
                }),
            )
        }
        AddOutcome::Duplicate => (
            StatusCode::CONFLICT,
            Json(SymbolActionResponse {
                status: "already_subscribed",
                symbol: normalized,
            }),
        ),
        AddOutcome::LimitExceeded => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(SymbolActionResponse {
                status: "limit_exceeded",
                symbol: normalized,
            }),
        ),
    }
}

async fn remove_symbol_handler(
    State(state): State<Arc<ApiState>>,
    Path(symbol): Path<String>,
) -> impl IntoResponse {
    let normalized = SubscriptionRegistry::normalize(&symbol);

    match state.registry.remove(&symbol) {
        RemoveOutcome::Removed => {
            if let Err(e) = state
                .commands
                .send(FeedCommand::Unsubscribe(normalized.clone()))
                .await
            {
                tracing::warn!(symbol = %normalized, error = %e, "Unsubscribe command not delivered");
            }
            tracing::info!(symbol = %normalized, "Symbol unsubscribed");
            (
                StatusCode::OK,
                Json(SymbolActionResponse {
                    status: "unsubscribed",
                    symbol: normalized,
                }),
            )
        }
        RemoveOutcome::NotFound => (
            StatusCode::NOT_FOUND,
            Json(SymbolActionResponse {
                status: "not_subscribed",
                symbol: normalized,
            }),
        ),
    }
}

async fn restart_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    if let Err(e) = state.commands.send(FeedCommand::Restart).await {
        tracing::error!(error = %e, "Restart command not delivered");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "unavailable" })),
        );
    }

    tracing::info!("Restart requested via API");
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "restarting" })),
    )
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

// =============================================================================
// Errors
// =============================================================================

/// API server errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn stats_response_flattens_snapshot() {
        let stats = BridgeStats::new();
        stats.increment_received();

        let response = StatsResponse {
            version: "0.1.0".to_string(),
            uptime_secs: 5,
            connected_secs: None,
            symbols: vec!["AAPL".to_string()],
            stats: stats.snapshot(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["version"], "0.1.0");
        assert_eq!(json["received_count"], 1);
        assert_eq!(json["state"], "disconnected");
        assert_eq!(json["symbols"][0], "AAPL");
    }
}
