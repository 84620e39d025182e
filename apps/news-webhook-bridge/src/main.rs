//! News Webhook Bridge Binary
//!
//! Starts the news-to-webhook streaming bridge.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin news-webhook-bridge
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `WEBHOOK_URL`: Downstream webhook endpoint
//!
//! ## Optional
//! - `FEED_TOKEN`: Upstream feed credential (without it the connection
//!   parks until a restart)
//! - `FEED_URL`: Feed WebSocket URL (default: wss://ws.finnhub.io)
//! - `WEBHOOK_SECRET`: Bearer credential for the webhook
//! - `BRIDGE_SYMBOLS`: Comma-separated initial subscriptions
//! - `BRIDGE_HTTP_PORT`: Operational API port (default: 8080)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: true)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4318>)
//! - `OTEL_SERVICE_NAME`: Service name (default: news-webhook-bridge)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use news_webhook_bridge::domain::registry::AddOutcome;
use news_webhook_bridge::infrastructure::api::{ApiServer, ApiState};
use news_webhook_bridge::infrastructure::feed::{FeedClient, FeedCommand};
use news_webhook_bridge::infrastructure::sink::{WebhookSink, WebhookSinkConfig};
use news_webhook_bridge::infrastructure::telemetry;
use news_webhook_bridge::{BridgeConfig, BridgeStats, SubscriptionRegistry, init_metrics};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    load_dotenv();

    // Initialize telemetry (OpenTelemetry + tracing)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting News Webhook Bridge");

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics();

    let config = BridgeConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let stats = Arc::new(BridgeStats::new());

    // Seed the subscription registry from configuration
    let registry = Arc::new(SubscriptionRegistry::new());
    for symbol in &config.initial_symbols {
        match registry.add(symbol) {
            AddOutcome::Added => {}
            AddOutcome::Duplicate => {
                tracing::debug!(symbol = %symbol, "Duplicate initial symbol ignored");
            }
            AddOutcome::LimitExceeded => {
                tracing::warn!(symbol = %symbol, "Initial symbol dropped; registry at capacity");
            }
        }
    }
    tracing::info!(count = registry.len(), "Subscription registry seeded");

    // Webhook sink
    let sink_config = WebhookSinkConfig {
        url: config.webhook.url.clone(),
        secret: config.webhook.secret.clone(),
        timeout: config.webhook.request_timeout,
    };
    let sink = Arc::new(WebhookSink::new(sink_config, Arc::clone(&stats))?);

    // Feed client
    let (command_tx, command_rx) = mpsc::channel::<FeedCommand>(32);
    let feed_client = Arc::new(FeedClient::new(
        config.feed.clone(),
        Arc::clone(&registry),
        sink,
        Arc::clone(&stats),
        shutdown_token.clone(),
    ));

    tokio::spawn(async move {
        if let Err(e) = feed_client.run(command_rx).await {
            tracing::error!(error = %e, "Feed client error");
        }
    });

    // Operational API server
    let api_state = Arc::new(ApiState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&stats),
        Arc::clone(&registry),
        command_tx,
    ));
    let api_server = ApiServer::new(
        config.server.http_port,
        api_state,
        shutdown_token.clone(),
    );

    tokio::spawn(async move {
        if let Err(e) = api_server.run().await {
            tracing::error!(error = %e, "Operational API error");
        }
    });

    tracing::info!("Bridge ready");

    await_shutdown(shutdown_token).await;

    tracing::info!("Bridge stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Log the parsed configuration. Credentials are never logged.
fn log_config(config: &BridgeConfig) {
    tracing::info!(
        feed_url = %config.feed.url,
        feed_token_present = config.feed.token.is_some(),
        webhook_secret_present = config.webhook.secret.is_some(),
        http_port = config.server.http_port,
        initial_symbols = config.initial_symbols.len(),
        "Configuration loaded"
    );
}

/// Walk ancestor directories for a .env file; `load_dotenv` already
/// tried the current directory.
fn load_dotenv_from_ancestors() {
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
