//! Feed Wire Message Types
//!
//! Wire format types for the upstream news feed WebSocket.
//!
//! # Inbound
//!
//! Every inbound frame is a JSON object carrying at minimum a `type`
//! discriminator:
//!
//! - `news`: a news article attached to a subscribed symbol
//! - `ping`: application-level liveness probe; the bridge must answer
//!   with a `pong` frame on the same socket
//! - anything else: logged and dropped
//!
//! # Outbound
//!
//! ```json
//! {"type":"subscribe","symbol":"AAPL"}
//! {"type":"unsubscribe","symbol":"AAPL"}
//! {"type":"pong"}
//! ```

use serde::Serialize;

use crate::domain::event::RawNews;

/// Decoded inbound frame from the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedFrame {
    /// A news article for a subscribed symbol.
    News(RawNews),
    /// Application-level liveness probe from the upstream.
    Ping,
    /// A parseable frame of a kind the bridge does not handle.
    Other {
        /// Value of the frame's `type` discriminator.
        kind: String,
    },
}

/// Outbound control frame sent to the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame {
    /// Subscribe to a symbol's news stream.
    Subscribe {
        /// Topic to subscribe to.
        symbol: String,
    },
    /// Unsubscribe from a symbol's news stream.
    Unsubscribe {
        /// Topic to unsubscribe from.
        symbol: String,
    },
    /// Reply to an application-level ping.
    Pong,
}

impl OutboundFrame {
    /// Build a subscribe frame for a topic.
    #[must_use]
    pub fn subscribe(symbol: impl Into<String>) -> Self {
        Self::Subscribe {
            symbol: symbol.into(),
        }
    }

    /// Build an unsubscribe frame for a topic.
    #[must_use]
    pub fn unsubscribe(symbol: impl Into<String>) -> Self {
        Self::Unsubscribe {
            symbol: symbol.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_frame_wire_format() {
        let json = serde_json::to_string(&OutboundFrame::subscribe("AAPL")).unwrap();
        assert_eq!(json, r#"{"type":"subscribe","symbol":"AAPL"}"#);
    }

    #[test]
    fn unsubscribe_frame_wire_format() {
        let json = serde_json::to_string(&OutboundFrame::unsubscribe("MSFT")).unwrap();
        assert_eq!(json, r#"{"type":"unsubscribe","symbol":"MSFT"}"#);
    }

    #[test]
    fn pong_frame_wire_format() {
        let json = serde_json::to_string(&OutboundFrame::Pong).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);
    }
}
