//! Configuration
//!
//! Bridge configuration types, loaded once from environment variables
//! at startup.

mod settings;

pub use settings::{
    BridgeConfig, ConfigError, FeedSettings, FeedToken, ServerSettings, WebhookSettings,
};
