//! Bridge Statistics
//!
//! Process-wide counters and connection status, written by the
//! connection manager and the forwarding sink, read by the operational
//! API. All writes are simple bumps; derived values (uptime etc.) are
//! computed by readers from the snapshot.

use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// Feed connection lifecycle state.
///
/// Exclusively written by the connection manager; everything else only
/// reads the published snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No connection; may be waiting on backoff or a manual restart.
    Disconnected,
    /// Dialing/upgrading the WebSocket.
    Connecting,
    /// Connected and processing frames.
    Connected,
    /// Shutting down; no reconnect will follow.
    Closing,
}

impl ConnectionState {
    /// Human-readable state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Closing,
            _ => Self::Disconnected,
        }
    }

    const fn as_u8(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Connected => 2,
            Self::Closing => 3,
        }
    }
}

/// Shared mutable statistics record.
#[derive(Debug, Default)]
pub struct BridgeStats {
    state: AtomicU8,
    received: AtomicU64,
    sent: AtomicU64,
    errors: AtomicU64,
    reconnect_attempts: AtomicU32,
    last_message_at: RwLock<Option<DateTime<Utc>>>,
    connected_since: RwLock<Option<DateTime<Utc>>>,
}

impl BridgeStats {
    /// Create a zeroed stats record in the Disconnected state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Publish a connection state change.
    pub fn set_state(&self, state: ConnectionState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }

    /// Mark the feed connected and stamp `connected_since`.
    pub fn mark_connected(&self) {
        self.set_state(ConnectionState::Connected);
        *self.connected_since.write() = Some(Utc::now());
    }

    /// Mark the feed disconnected and clear `connected_since`.
    pub fn mark_disconnected(&self) {
        self.set_state(ConnectionState::Disconnected);
        *self.connected_since.write() = None;
    }

    /// Count one inbound frame.
    pub fn increment_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Stamp the last-event timestamp (news frames only).
    pub fn record_last_message(&self) {
        *self.last_message_at.write() = Some(Utc::now());
    }

    /// Count one successful webhook delivery.
    pub fn increment_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one fault (parse, transport, delivery, or protocol).
    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Publish the current reconnect attempt count.
    pub fn set_reconnect_attempts(&self, attempts: u32) {
        self.reconnect_attempts.store(attempts, Ordering::SeqCst);
    }

    /// Current reconnect attempt count.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::SeqCst)
    }

    /// Total frames received.
    #[must_use]
    pub fn received_count(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Total events delivered to the webhook.
    #[must_use]
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Total faults of any kind.
    #[must_use]
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Consistent point-in-time snapshot for readers.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let state = self.state();
        StatsSnapshot {
            connected: state == ConnectionState::Connected,
            state,
            received_count: self.received_count(),
            sent_count: self.sent_count(),
            error_count: self.error_count(),
            reconnect_attempts: self.reconnect_attempts(),
            last_message_at: *self.last_message_at.read(),
            connected_since: *self.connected_since.read(),
        }
    }
}

/// Read-only view of [`BridgeStats`] for the operational API.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Whether the feed is currently connected.
    pub connected: bool,
    /// Connection lifecycle state.
    pub state: ConnectionState,
    /// Total frames received from the feed.
    pub received_count: u64,
    /// Total events delivered to the webhook.
    pub sent_count: u64,
    /// Total faults (parse, transport, delivery, protocol).
    pub error_count: u64,
    /// Reconnect attempts since the last successful connect.
    pub reconnect_attempts: u32,
    /// Timestamp of the last news frame, if any.
    pub last_message_at: Option<DateTime<Utc>>,
    /// When the current connection was established, if connected.
    pub connected_since: Option<DateTime<Utc>>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected_and_zeroed() {
        let stats = BridgeStats::new();
        let snapshot = stats.snapshot();

        assert_eq!(snapshot.state, ConnectionState::Disconnected);
        assert!(!snapshot.connected);
        assert_eq!(snapshot.received_count, 0);
        assert_eq!(snapshot.sent_count, 0);
        assert_eq!(snapshot.error_count, 0);
        assert!(snapshot.last_message_at.is_none());
        assert!(snapshot.connected_since.is_none());
    }

    #[test]
    fn counters_accumulate() {
        let stats = BridgeStats::new();
        stats.increment_received();
        stats.increment_received();
        stats.increment_sent();
        stats.increment_errors();

        assert_eq!(stats.received_count(), 2);
        assert_eq!(stats.sent_count(), 1);
        assert_eq!(stats.error_count(), 1);
    }

    #[test]
    fn mark_connected_stamps_since() {
        let stats = BridgeStats::new();
        stats.mark_connected();

        let snapshot = stats.snapshot();
        assert!(snapshot.connected);
        assert_eq!(snapshot.state, ConnectionState::Connected);
        assert!(snapshot.connected_since.is_some());
    }

    #[test]
    fn mark_disconnected_clears_since() {
        let stats = BridgeStats::new();
        stats.mark_connected();
        stats.mark_disconnected();

        let snapshot = stats.snapshot();
        assert!(!snapshot.connected);
        assert!(snapshot.connected_since.is_none());
    }

    #[test]
    fn last_message_stamped_independently_of_received() {
        let stats = BridgeStats::new();
        stats.increment_received();
        assert!(stats.snapshot().last_message_at.is_none());

        stats.record_last_message();
        assert!(stats.snapshot().last_message_at.is_some());
    }

    #[test]
    fn state_round_trips_through_u8() {
        let stats = BridgeStats::new();
        for state in [
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Closing,
            ConnectionState::Disconnected,
        ] {
            stats.set_state(state);
            assert_eq!(stats.state(), state);
        }
    }

    #[test]
    fn state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ConnectionState::Connected).unwrap(),
            "\"connected\""
        );
    }
}
