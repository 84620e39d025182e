//! Prometheus Metrics Module
//!
//! Exposes bridge metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Frames**: inbound frame counts by kind
//! - **Forwarding**: delivered and failed webhook posts
//! - **Connection**: state gauge and reconnect attempts
//!
//! # Integration
//!
//! Metrics are rendered at `GET /metrics` on the operational API port.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "bridge_frames_received_total",
        "Total frames received from the news feed"
    );
    describe_counter!(
        "bridge_events_forwarded_total",
        "Total events delivered to the webhook"
    );
    describe_counter!(
        "bridge_delivery_failures_total",
        "Total webhook deliveries that failed and were dropped"
    );
    describe_counter!(
        "bridge_frame_errors_total",
        "Total malformed or unrecognized inbound frames"
    );
    describe_counter!(
        "bridge_reconnects_total",
        "Total feed reconnection attempts"
    );
    describe_gauge!(
        "bridge_feed_connected",
        "Whether the feed connection is currently established (0/1)"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Metric labels for inbound frame kinds.
#[derive(Debug, Clone, Copy)]
pub enum FrameKind {
    /// News article frame.
    News,
    /// Application-level ping frame.
    Ping,
    /// Parseable frame of an unhandled kind.
    Other,
}

impl FrameKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Ping => "ping",
            Self::Other => "other",
        }
    }
}

/// Record one inbound frame.
pub fn record_frame_received(kind: FrameKind) {
    counter!(
        "bridge_frames_received_total",
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record a successful webhook delivery.
pub fn record_event_forwarded() {
    counter!("bridge_events_forwarded_total").increment(1);
}

/// Record a dropped webhook delivery.
pub fn record_delivery_failure() {
    counter!("bridge_delivery_failures_total").increment(1);
}

/// Record a malformed or unrecognized inbound frame.
pub fn record_frame_error() {
    counter!("bridge_frame_errors_total").increment(1);
}

/// Record a feed reconnection attempt.
pub fn record_reconnect() {
    counter!("bridge_reconnects_total").increment(1);
}

/// Update the feed-connected gauge.
pub fn set_feed_connected(connected: bool) {
    gauge!("bridge_feed_connected").set(if connected { 1.0 } else { 0.0 });
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_kind_as_str() {
        assert_eq!(FrameKind::News.as_str(), "news");
        assert_eq!(FrameKind::Ping.as_str(), "ping");
        assert_eq!(FrameKind::Other.as_str(), "other");
    }

    #[test]
    fn handle_absent_before_init() {
        // Recording without an installed recorder is a no-op, not a panic.
        record_event_forwarded();
        record_frame_error();
        set_feed_connected(true);
    }
}
