//! Upstream Feed Infrastructure
//!
//! Everything that touches the news-feed WebSocket: wire messages, the
//! JSON codec, reconnection backoff, keep-alive tracking, and the
//! connection manager itself.

pub mod client;
pub mod codec;
pub mod keepalive;
pub mod messages;
pub mod reconnect;

pub use client::{FeedClient, FeedClientError, FeedCommand};
pub use codec::{CodecError, FeedCodec};
pub use keepalive::{KeepaliveConfig, KeepaliveTracker};
pub use messages::{FeedFrame, OutboundFrame};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
