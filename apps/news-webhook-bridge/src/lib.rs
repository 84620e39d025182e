#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! News Webhook Bridge
//!
//! A streaming bridge that maintains a single persistent WebSocket
//! connection to an upstream market-news feed, normalizes incoming
//! articles into a canonical event shape, and forwards each one to a
//! downstream workflow-automation webhook over HTTP.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core types with no external integrations
//!   - `event`: Raw feed articles and canonical event normalization
//!   - `registry`: Ordered, capped topic subscription set
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `feed`: WebSocket connection manager, codec, backoff, keep-alive
//!   - `sink`: Webhook delivery over HTTP
//!   - `api`: Operational HTTP API (health, stats, symbols, restart)
//!   - `config`: Environment-driven configuration
//!   - `stats`: Shared runtime counters and connection state
//!   - `metrics`: Prometheus metrics
//!   - `telemetry`: OpenTelemetry + tracing setup
//!
//! # Data Flow
//!
//! ```text
//! News Feed WS ────► Connection ────► Normalizer ────► Webhook Sink ──► HTTP POST
//!                     Manager              │
//!                        ▲                 └──► Stats / Metrics
//!                        │
//!                  Operational API (subscribe / unsubscribe / restart)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core event and subscription types.
pub mod domain;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::event::{CanonicalEvent, RawNews};
pub use domain::registry::{AddOutcome, RemoveOutcome, SubscriptionRegistry};

// Infrastructure config
pub use infrastructure::config::{
    BridgeConfig, ConfigError, FeedSettings, FeedToken, ServerSettings, WebhookSettings,
};

// Feed client
pub use infrastructure::feed::{FeedClient, FeedClientError, FeedCommand};

// Webhook sink
pub use infrastructure::sink::{
    DeliveryOutcome, EventSink, SinkError, WebhookSink, WebhookSinkConfig,
};

// Operational API (for integration tests)
pub use infrastructure::api::{ApiServer, ApiServerError, ApiState, router};

// Stats
pub use infrastructure::stats::{BridgeStats, ConnectionState, StatsSnapshot};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
