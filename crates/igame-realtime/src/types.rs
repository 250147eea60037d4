//! Configuration, protocol types and channel messages.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Connection settings for the realtime server.
#[derive(Clone)]
pub struct RealtimeConfig {
    /// Project URL, e.g. `https://abc.supabase.co`. `http(s)` is rewritten
    /// to `ws(s)`.
    pub url: String,
    /// Anon (publishable) key.
    pub api_key: String,
    /// Optional user JWT sent with each channel join.
    pub access_token: Option<String>,
    pub heartbeat_interval_secs: u64,
    /// Bound on both the socket handshake and the join reply.
    pub connect_timeout_secs: u64,
}

impl fmt::Debug for RealtimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("heartbeat_interval_secs", &self.heartbeat_interval_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            access_token: None,
            heartbeat_interval_secs: 25,
            connect_timeout_secs: 15,
        }
    }
}

impl RealtimeConfig {
    /// Build the WebSocket URL.
    pub fn ws_url(&self) -> String {
        let base = self.url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!(
            "{base}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            self.api_key
        )
    }
}

// ---------------------------------------------------------------------------
// Phoenix Protocol Types
// ---------------------------------------------------------------------------

/// A Phoenix protocol message envelope (v1 JSON format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    pub payload: serde_json::Value,
    #[serde(rename = "ref")]
    pub msg_ref: Option<String>,
}

// ---------------------------------------------------------------------------
// Channel Configuration
// ---------------------------------------------------------------------------

/// Row-change kind, as named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeEvent {
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "*")]
    All,
}

impl ChangeEvent {
    pub fn matches(self, other: ChangeEvent) -> bool {
        self == ChangeEvent::All || self == other
    }
}

/// One `postgres_changes` subscription entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFilter {
    pub event: ChangeEvent,
    pub schema: String,
    pub table: String,
}

impl ChangeFilter {
    /// A filter on `table` in the `public` schema.
    pub fn new(event: ChangeEvent, table: impl Into<String>) -> Self {
        Self {
            event,
            schema: "public".to_string(),
            table: table.into(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn matches(&self, change: &RowChange) -> bool {
        self.event.matches(change.event) && self.schema == change.schema && self.table == change.table
    }
}

/// A named channel and the row changes it listens for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: String,
    pub filters: Vec<ChangeFilter>,
}

impl ChannelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
        }
    }

    pub fn topic(&self) -> String {
        format!("realtime:{}", self.name)
    }

    /// Serialize to the JSON payload expected by Supabase phx_join.
    pub(crate) fn to_join_payload(&self, access_token: Option<&str>) -> serde_json::Value {
        // The server rejects duplicate (event, schema, table) bindings.
        let mut bindings: Vec<&ChangeFilter> = Vec::new();
        for filter in &self.filters {
            if !bindings.contains(&filter) {
                bindings.push(filter);
            }
        }

        let mut payload = serde_json::json!({
            "config": {
                "broadcast": { "self": false, "ack": false },
                "presence": { "key": "" },
                "postgres_changes": bindings,
            }
        });
        if let Some(token) = access_token {
            payload["access_token"] = serde_json::json!(token);
        }
        payload
    }
}

// ---------------------------------------------------------------------------
// Channel Messages
// ---------------------------------------------------------------------------

/// A row change pushed by the server (`payload.data` of `postgres_changes`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowChange {
    #[serde(rename = "type")]
    pub event: ChangeEvent,
    pub schema: String,
    pub table: String,
    #[serde(default)]
    pub record: serde_json::Value,
    #[serde(default)]
    pub old_record: serde_json::Value,
    #[serde(default)]
    pub commit_timestamp: Option<String>,
}

/// Subscription state reported to the status handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeStatus {
    Subscribed,
    Closed,
    ChannelError(String),
    TimedOut,
    /// The retry policy is exhausted; no further reconnects happen.
    GaveUp,
}

impl SubscribeStatus {
    /// Whether this status ends the current connection attempt.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Closed | Self::ChannelError(_) | Self::TimedOut
        )
    }
}

impl fmt::Display for SubscribeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscribed => f.write_str("SUBSCRIBED"),
            Self::Closed => f.write_str("CLOSED"),
            Self::ChannelError(reason) => write!(f, "CHANNEL_ERROR: {reason}"),
            Self::TimedOut => f.write_str("TIMED_OUT"),
            Self::GaveUp => f.write_str("GAVE_UP"),
        }
    }
}

/// What a connected channel yields.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    Status(SubscribeStatus),
    Change(RowChange),
}
