//! Reconnection Policy
//!
//! Exponential backoff for feed reconnection. The delay before attempt
//! `k` is `min(base * 2^k, cap)`; after the attempt ceiling is reached
//! the policy stops producing delays and a manual restart is required
//! to re-arm the connection.

use std::time::Duration;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Base delay for the first reconnection attempt.
    pub base_delay: Duration,
    /// Ceiling on the delay between attempts.
    pub max_delay: Duration,
    /// Maximum number of automatic attempts before requiring a manual
    /// restart.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

/// Reconnection policy implementing capped exponential backoff.
///
/// # Example
///
/// ```rust
/// use news_webhook_bridge::infrastructure::feed::reconnect::{
///     ReconnectConfig, ReconnectPolicy,
/// };
/// use std::time::Duration;
///
/// let mut policy = ReconnectPolicy::new(ReconnectConfig::default());
/// assert_eq!(policy.next_delay(), Some(Duration::from_secs(2)));
/// assert_eq!(policy.next_delay(), Some(Duration::from_secs(4)));
///
/// // Successful connection re-arms the schedule
/// policy.reset();
/// assert_eq!(policy.next_delay(), Some(Duration::from_secs(2)));
/// ```
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    attempt: u32,
}

impl ReconnectPolicy {
    /// Create a new policy.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Delay before the next reconnection attempt, or `None` once the
    /// attempt ceiling has been reached.
    #[must_use]
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.config.max_attempts {
            return None;
        }

        let base_ms = u64::try_from(self.config.base_delay.as_millis()).unwrap_or(u64::MAX);
        let scaled_ms = base_ms
            .checked_shl(self.attempt)
            .unwrap_or(u64::MAX);
        let cap_ms = u64::try_from(self.config.max_delay.as_millis()).unwrap_or(u64::MAX);

        self.attempt += 1;
        Some(Duration::from_millis(scaled_ms.min(cap_ms)))
    }

    /// Reset the schedule after a successful connection or a manual
    /// restart.
    pub const fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of attempts consumed since the last reset.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt
    }

    /// Whether the attempt ceiling has been reached.
    #[must_use]
    pub const fn exhausted(&self) -> bool {
        self.attempt >= self.config.max_attempts
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
        let config = ReconnectConfig::default();
        assert_eq!(config.base_delay, Duration::from_secs(2));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert_eq!(config.max_attempts, 10);
    }

    #[test]
    fn delays_follow_capped_doubling() {
        let mut policy = ReconnectPolicy::new(ReconnectConfig::default());

        let expected_secs = [2, 4, 8, 16, 30, 30, 30, 30, 30, 30];
        for (k, &secs) in expected_secs.iter().enumerate() {
            assert_eq!(
                policy.next_delay(),
                Some(Duration::from_secs(secs)),
                "attempt {k}"
            );
        }
    }

    #[test]
    fn stops_after_attempt_ceiling() {
        let mut policy = ReconnectPolicy::new(ReconnectConfig::default());

        for _ in 0..10 {
            assert!(policy.next_delay().is_some());
        }
        assert!(policy.next_delay().is_none());
        assert!(policy.exhausted());
        assert_eq!(policy.attempt_count(), 10);
    }

    #[test]
    fn reset_rearms_schedule() {
        let mut policy = ReconnectPolicy::new(ReconnectConfig::default());

        while policy.next_delay().is_some() {}
        assert!(policy.exhausted());

        policy.reset();
        assert!(!policy.exhausted());
        assert_eq!(policy.attempt_count(), 0);
        assert_eq!(policy.next_delay(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn custom_config_respected() {
        let mut policy = ReconnectPolicy::new(ReconnectConfig {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(250),
            max_attempts: 3,
        });

        assert_eq!(policy.next_delay(), Some(Duration::from_millis(100)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(200)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(250)));
        assert_eq!(policy.next_delay(), None);
    }
}
