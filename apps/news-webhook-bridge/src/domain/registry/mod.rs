//! Topic Subscription Registry
//!
//! Tracks the set of topics (ticker symbols) the bridge subscribes to
//! on the upstream feed.
//!
//! # Design
//!
//! The registry is the single source of truth for subscriptions:
//! - Insertion order is preserved so replay after reconnect is
//!   deterministic.
//! - Topics are unique and case-normalized (uppercase) on input.
//! - Cardinality is capped to prevent unbounded subscription growth.
//!
//! The connection manager replays `list()` on every reconnect; the
//! operational API mutates the registry whether or not the feed is
//! currently connected.

use parking_lot::RwLock;

/// Default maximum number of topics the registry will hold.
pub const DEFAULT_TOPIC_CAPACITY: usize = 50;

/// Outcome of an add operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Topic was added.
    Added,
    /// Topic was already present; registry unchanged.
    Duplicate,
    /// Registry is at capacity; registry unchanged.
    LimitExceeded,
}

/// Outcome of a remove operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Topic was removed.
    Removed,
    /// Topic was not present.
    NotFound,
}

/// Ordered, capped set of subscription topics.
///
/// Thread-safe; shared between the connection manager and the
/// operational API.
///
/// # Example
///
/// ```rust
/// use news_webhook_bridge::domain::registry::{AddOutcome, SubscriptionRegistry};
///
/// let registry = SubscriptionRegistry::new();
/// assert_eq!(registry.add("aapl"), AddOutcome::Added);
/// assert_eq!(registry.add("AAPL"), AddOutcome::Duplicate);
/// assert_eq!(registry.list(), vec!["AAPL".to_string()]);
/// ```
pub struct SubscriptionRegistry {
    topics: RwLock<Vec<String>>,
    capacity: usize,
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionRegistry {
    /// Create a registry with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TOPIC_CAPACITY)
    }

    /// Create a registry with a custom capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(Vec::new()),
            capacity,
        }
    }

    /// Normalize a topic for storage and comparison.
    #[must_use]
    pub fn normalize(topic: &str) -> String {
        topic.trim().to_uppercase()
    }

    /// Add a topic. Input is case-normalized first.
    pub fn add(&self, topic: &str) -> AddOutcome {
        let normalized = Self::normalize(topic);
        let mut topics = self.topics.write();

        if topics.iter().any(|t| t == &normalized) {
            return AddOutcome::Duplicate;
        }
        if topics.len() >= self.capacity {
            return AddOutcome::LimitExceeded;
        }

        topics.push(normalized);
        AddOutcome::Added
    }

    /// Remove a topic. Input is case-normalized first.
    pub fn remove(&self, topic: &str) -> RemoveOutcome {
        let normalized = Self::normalize(topic);
        let mut topics = self.topics.write();

        let before = topics.len();
        topics.retain(|t| t != &normalized);

        if topics.len() < before {
            RemoveOutcome::Removed
        } else {
            RemoveOutcome::NotFound
        }
    }

    /// Current topics in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.topics.read().clone()
    }

    /// Number of topics currently registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.read().len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.read().is_empty()
    }

    /// Maximum number of topics this registry will hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

// =============================================================================
// Tests
// =============================================================================
