//! Keep-Alive Tracking
//!
//! Transport-level liveness for the feed connection. The connection
//! manager sends a WebSocket ping on a fixed interval while connected;
//! this tracker remembers when the socket last showed signs of life so
//! half-open connections are detected faster than the upstream's own
//! timeout.
//!
//! The tracker is owned by the connection task and dies with it, so a
//! stale keep-alive can never outlive its connection.

use std::time::{Duration, Instant};

/// Configuration for keep-alive behavior.
#[derive(Debug, Clone)]
pub struct KeepaliveConfig {
    /// Interval between transport pings while connected.
    pub ping_interval: Duration,
    /// Silence threshold after a ping before the connection is
    /// considered dead.
    pub pong_timeout: Duration,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(60),
        }
    }
}

/// Tracks socket liveness across ping/pong exchanges.
#[derive(Debug)]
pub struct KeepaliveTracker {
    last_activity: Instant,
    awaiting_pong: bool,
}

impl Default for KeepaliveTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl KeepaliveTracker {
    /// Create a tracker for a fresh connection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_activity: Instant::now(),
            awaiting_pong: false,
        }
    }

    /// Record inbound activity (pong or any data frame).
    pub fn record_activity(&mut self) {
        self.last_activity = Instant::now();
        self.awaiting_pong = false;
    }

    /// Record that a ping was just sent.
    pub fn mark_ping_sent(&mut self) {
        self.awaiting_pong = true;
    }

    /// Whether the connection has gone silent past the timeout while a
    /// pong was outstanding.
    #[must_use]
    pub fn timed_out(&self, timeout: Duration) -> bool {
        self.awaiting_pong && self.last_activity.elapsed() > timeout
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = KeepaliveConfig::default();
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.pong_timeout, Duration::from_secs(60));
    }

    #[test]
    fn fresh_tracker_is_alive() {
        let tracker = KeepaliveTracker::new();
        assert!(!tracker.timed_out(Duration::from_secs(60)));
    }

    #[test]
    fn no_timeout_without_outstanding_ping() {
        let mut tracker = KeepaliveTracker::new();
        tracker.last_activity = Instant::now() - Duration::from_secs(120);
        assert!(!tracker.timed_out(Duration::from_secs(60)));
    }

    #[test]
    fn timeout_when_silent_after_ping() {
        let mut tracker = KeepaliveTracker::new();
        tracker.mark_ping_sent();
        tracker.last_activity = Instant::now() - Duration::from_secs(120);
        assert!(tracker.timed_out(Duration::from_secs(60)));
    }

    #[test]
    fn activity_clears_outstanding_ping() {
        let mut tracker = KeepaliveTracker::new();
        tracker.mark_ping_sent();
        tracker.record_activity();
        assert!(!tracker.timed_out(Duration::from_secs(0)));
    }
}
