//! Bridge Configuration Settings
//!
//! Configuration types for the bridge, loaded from environment
//! variables. Everything is resolved exactly once at startup.
//!
//! A missing feed token is deliberately not a load error: the
//! connection manager treats it as a configuration fault and parks the
//! connection instead of crashing the process or retrying in a loop.

use std::time::Duration;

use crate::infrastructure::feed::keepalive::KeepaliveConfig;
use crate::infrastructure::feed::reconnect::ReconnectConfig;

/// Default upstream feed WebSocket URL.
pub const DEFAULT_FEED_URL: &str = "wss://ws.finnhub.io";

/// Upstream feed credential, passed as a query-string token.
#[derive(Clone)]
pub struct FeedToken(String);

impl FeedToken {
    /// Wrap a non-empty token value.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() { None } else { Some(Self(token)) }
    }

    /// The raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for FeedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FeedToken").field(&"[REDACTED]").finish()
    }
}

/// Upstream feed connection settings.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Feed WebSocket URL (without the token query parameter).
    pub url: String,
    /// Feed credential; absent means the connection manager parks.
    pub token: Option<FeedToken>,
    /// Reconnection backoff settings.
    pub reconnect: ReconnectConfig,
    /// Transport keep-alive settings.
    pub keepalive: KeepaliveConfig,
    /// Delay before replaying subscriptions after a connect; the
    /// upstream drops subscribe requests sent immediately after the
    /// handshake.
    pub replay_delay: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            token: None,
            reconnect: ReconnectConfig::default(),
            keepalive: KeepaliveConfig::default(),
            replay_delay: Duration::from_secs(1),
        }
    }
}

impl FeedSettings {
    /// Full dial URL including the token credential, or `None` when no
    /// token is configured.
    #[must_use]
    pub fn stream_url(&self) -> Option<String> {
        self.token
            .as_ref()
            .map(|token| format!("{}?token={}", self.url, token.as_str()))
    }
}

/// Downstream webhook settings.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    /// Webhook endpoint URL.
    pub url: String,
    /// Optional bearer credential.
    pub secret: Option<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

/// Operational HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Listening port for the operational API.
    pub http_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { http_port: 8080 }
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Upstream feed settings.
    pub feed: FeedSettings,
    /// Downstream webhook settings.
    pub webhook: WebhookSettings,
    /// Operational server settings.
    pub server: ServerSettings,
    /// Topics to subscribe to at startup.
    pub initial_symbols: Vec<String>,
}

impl BridgeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `WEBHOOK_URL` is missing or empty. A
    /// missing `FEED_TOKEN` is not an error here; the connection
    /// manager handles it as a parked configuration fault.
    pub fn from_env() -> Result<Self, ConfigError> {
        let webhook_url = std::env::var("WEBHOOK_URL")
            .map_err(|_| ConfigError::MissingEnvVar("WEBHOOK_URL".to_string()))?;
        if webhook_url.is_empty() {
            return Err(ConfigError::EmptyValue("WEBHOOK_URL".to_string()));
        }

        let feed_url = std::env::var("FEED_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.to_string());
        let token = std::env::var("FEED_TOKEN").ok().and_then(FeedToken::new);

        let defaults = FeedSettings::default();
        let feed = FeedSettings {
            url: feed_url,
            token,
            reconnect: ReconnectConfig {
                base_delay: parse_env_duration_secs(
                    "BRIDGE_RECONNECT_BASE_SECS",
                    defaults.reconnect.base_delay,
                ),
                max_delay: parse_env_duration_secs(
                    "BRIDGE_RECONNECT_CAP_SECS",
                    defaults.reconnect.max_delay,
                ),
                max_attempts: parse_env_u32(
                    "BRIDGE_MAX_RECONNECT_ATTEMPTS",
                    defaults.reconnect.max_attempts,
                ),
            },
            keepalive: KeepaliveConfig {
                ping_interval: parse_env_duration_secs(
                    "BRIDGE_KEEPALIVE_INTERVAL_SECS",
                    defaults.keepalive.ping_interval,
                ),
                pong_timeout: parse_env_duration_secs(
                    "BRIDGE_KEEPALIVE_TIMEOUT_SECS",
                    defaults.keepalive.pong_timeout,
                ),
            },
            replay_delay: parse_env_duration_millis(
                "BRIDGE_REPLAY_DELAY_MS",
                defaults.replay_delay,
            ),
        };

        let webhook = WebhookSettings {
            url: webhook_url,
            secret: std::env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            request_timeout: parse_env_duration_secs(
                "BRIDGE_WEBHOOK_TIMEOUT_SECS",
                Duration::from_secs(12),
            ),
        };

        let server = ServerSettings {
            http_port: parse_env_u16("BRIDGE_HTTP_PORT", ServerSettings::default().http_port),
        };

        let initial_symbols = std::env::var("BRIDGE_SYMBOLS")
            .map(|raw| parse_symbol_list(&raw))
            .unwrap_or_default();

        Ok(Self {
            feed,
            webhook,
            server,
            initial_symbols,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

// =============================================================================
// Tests
// =============================================================================
