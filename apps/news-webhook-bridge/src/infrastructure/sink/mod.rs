//! Webhook Forwarding Sink
//!
//! Delivers canonical events to the downstream workflow-automation
//! webhook: one HTTP POST per event, JSON body, bounded timeout,
//! optional bearer credential.
//!
//! Delivery is fire-and-report. A failed delivery is logged and
//! counted but never retried; the bridge favors staying responsive to
//! new upstream events over guaranteeing delivery of any single one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::event::CanonicalEvent;
use crate::infrastructure::metrics;
use crate::infrastructure::stats::BridgeStats;

/// Bridge identifier included in the delivery envelope.
pub const BRIDGE_NAME: &str = "news-webhook-bridge";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The webhook acknowledged the event with a 2xx response.
    Delivered,
    /// Transport failure or non-2xx response; the event is dropped.
    Failed(String),
}

/// Errors raised while constructing the sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Port for event delivery, so the connection manager can be exercised
/// against test doubles.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one canonical event downstream.
    async fn deliver(&self, event: &CanonicalEvent) -> DeliveryOutcome;
}

/// Delivery envelope posted to the webhook.
#[derive(Debug, Serialize)]
struct WebhookEnvelope<'a> {
    /// Bridge identifier.
    bridge: &'static str,
    /// Send timestamp.
    sent_at: DateTime<Utc>,
    /// The canonical event itself.
    #[serde(flatten)]
    event: &'a CanonicalEvent,
}

/// Configuration for the webhook sink.
#[derive(Debug, Clone)]
pub struct WebhookSinkConfig {
    /// Webhook endpoint URL.
    pub url: String,
    /// Optional bearer credential for the webhook.
    pub secret: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl WebhookSinkConfig {
    /// Create a configuration with the default timeout.
    #[must_use]
    pub const fn new(url: String, secret: Option<String>) -> Self {
        Self {
            url,
            secret,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// HTTP sink that posts events to the configured webhook.
pub struct WebhookSink {
    client: reqwest::Client,
    config: WebhookSinkConfig,
    stats: Arc<BridgeStats>,
}

impl WebhookSink {
    /// Create a sink with a bounded-timeout HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::ClientBuild` if the HTTP client cannot be
    /// constructed.
    pub fn new(config: WebhookSinkConfig, stats: Arc<BridgeStats>) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SinkError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            config,
            stats,
        })
    }
}

#[async_trait]
impl EventSink for WebhookSink {
    async fn deliver(&self, event: &CanonicalEvent) -> DeliveryOutcome {
        let envelope = WebhookEnvelope {
            bridge: BRIDGE_NAME,
            sent_at: Utc::now(),
            event,
        };

        let mut request = self.client.post(&self.config.url).json(&envelope);
        if let Some(secret) = &self.config.secret {
            request = request.bearer_auth(secret);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = format!("webhook request failed: {e}");
                tracing::warn!(event_id = %event.id, error = %e, "Webhook delivery failed");
                self.stats.increment_errors();
                metrics::record_delivery_failure();
                return DeliveryOutcome::Failed(reason);
            }
        };

        let status = response.status();
        if status.is_success() {
            tracing::debug!(event_id = %event.id, status = status.as_u16(), "Event delivered");
            self.stats.increment_sent();
            metrics::record_event_forwarded();
            return DeliveryOutcome::Delivered;
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            event_id = %event.id,
            status = status.as_u16(),
            body = %body,
            "Webhook rejected event"
        );
        self.stats.increment_errors();
        metrics::record_delivery_failure();
        DeliveryOutcome::Failed(format!("webhook returned {status}"))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::RawNews;

    fn sample_event() -> CanonicalEvent {
        CanonicalEvent::from_raw(
            RawNews {
                symbol: "AAPL".to_string(),
                headline: "X".to_string(),
                summary: None,
                source: None,
                url: None,
                image: None,
                datetime: None,
                category: None,
                id: None,
                related: None,
            },
            1_700_000_000_000,
        )
    }

    #[test]
    fn envelope_carries_bridge_metadata_and_event() {
        let event = sample_event();
        let envelope = WebhookEnvelope {
            bridge: BRIDGE_NAME,
            sent_at: Utc::now(),
            event: &event,
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["bridge"], BRIDGE_NAME);
        assert!(json["sent_at"].is_string());
        // Event fields are flattened into the envelope
        assert_eq!(json["topic"], "AAPL");
        assert_eq!(json["id"], "AAPL-1700000000000");
    }

    #[test]
    fn config_default_timeout() {
        let config = WebhookSinkConfig::new("http://localhost/hook".to_string(), None);
        assert_eq!(config.timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn unreachable_webhook_counts_error() {
        let stats = Arc::new(BridgeStats::new());
        let config = WebhookSinkConfig {
            url: "http://127.0.0.1:1/hook".to_string(),
            secret: None,
            timeout: Duration::from_millis(500),
        };
        let sink = WebhookSink::new(config, Arc::clone(&stats)).unwrap();

        let outcome = sink.deliver(&sample_event()).await;

        assert!(matches!(outcome, DeliveryOutcome::Failed(_)));
        assert_eq!(stats.error_count(), 1);
        assert_eq!(stats.sent_count(), 0);
    }
}
