//! Realtime change-feed configuration.

use serde::{Deserialize, Serialize};

/// Realtime server connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeSchemaConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`. Empty disables realtime.
    pub url: String,
    /// Publishable (anon) key.
    pub api_key: String,
    /// Heartbeat interval in seconds (valid range: 5-60).
    pub heartbeat_interval: u32,
    /// WebSocket connect timeout in seconds (valid range: 1-60).
    pub connect_timeout_secs: u32,
    pub retry: RetrySchemaConfig,
}

impl std::fmt::Debug for RealtimeSchemaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeSchemaConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Default for RealtimeSchemaConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            heartbeat_interval: 25,
            connect_timeout_secs: 15,
            retry: RetrySchemaConfig::default(),
        }
    }
}

impl RealtimeSchemaConfig {
    pub fn is_enabled(&self) -> bool {
        !self.url.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategyKind {
    #[default]
    Fixed,
    Exponential,
}

/// Reconnect policy for realtime channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySchemaConfig {
    pub strategy: RetryStrategyKind,
    /// Base delay in milliseconds (valid range: 100-60000).
    pub delay_ms: u64,
    /// Upper bound for exponential delays in milliseconds.
    pub max_delay_ms: u64,
    /// Consecutive failed attempts before giving up. 0 means never give up.
    pub max_attempts: u32,
}

impl Default for RetrySchemaConfig {
    fn default() -> Self {
        Self {
            strategy: RetryStrategyKind::Fixed,
            delay_ms: 2000,
            max_delay_ms: 30_000,
            max_attempts: 10,
        }
    }
}
