use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("connection timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("failed to send {event}: {reason}")]
    Send { event: String, reason: String },

    #[error("protocol error: {0}")]
    Protocol(String),
}
