//! Translation of incoming Phoenix messages into channel messages.

use tracing::{debug, info, warn};

use crate::types::{ChannelMessage, PhoenixMessage, RowChange, SubscribeStatus};

fn reply_reason(payload: &serde_json::Value) -> String {
    payload
        .get("response")
        .and_then(|r| r.get("reason"))
        .and_then(|r| r.as_str())
        .unwrap_or("unknown error")
        .to_string()
}

/// Interpret one message received on the socket.
///
/// `topic` is the full channel topic and `join_ref` the ref of our
/// `phx_join`; replies to any other ref (heartbeats, leaves) are ignored.
pub(crate) fn translate(msg: &PhoenixMessage, topic: &str, join_ref: &str) -> Option<ChannelMessage> {
    if msg.topic != topic {
        if msg.event != "phx_reply" {
            debug!(topic = %msg.topic, event = %msg.event, "message for another topic");
        }
        return None;
    }

    match msg.event.as_str() {
        "phx_reply" => {
            if msg.msg_ref.as_deref() != Some(join_ref) {
                return None;
            }
            let status = msg.payload.get("status").and_then(|s| s.as_str())?;
            if status == "ok" {
                debug!(topic = %topic, "join acknowledged");
                Some(ChannelMessage::Status(SubscribeStatus::Subscribed))
            } else {
                let reason = reply_reason(&msg.payload);
                warn!(topic = %topic, status = %status, reason = %reason, "join rejected");
                Some(ChannelMessage::Status(SubscribeStatus::ChannelError(reason)))
            }
        }
        "phx_error" => {
            warn!(topic = %topic, "channel error");
            Some(ChannelMessage::Status(SubscribeStatus::ChannelError(
                "Channel error".to_string(),
            )))
        }
        "phx_close" => {
            info!(topic = %topic, "channel closed by server");
            Some(ChannelMessage::Status(SubscribeStatus::Closed))
        }
        "system" => {
            // Supabase confirms (or refuses) the postgres_changes bindings here.
            let status = msg.payload.get("status").and_then(|s| s.as_str());
            if status == Some("error") {
                let message = msg
                    .payload
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("subscription error")
                    .to_string();
                warn!(topic = %topic, %message, "system error");
                Some(ChannelMessage::Status(SubscribeStatus::ChannelError(message)))
            } else {
                debug!(topic = %topic, payload = %msg.payload, "system message");
                None
            }
        }
        "postgres_changes" => {
            let data = msg.payload.get("data")?;
            match serde_json::from_value::<RowChange>(data.clone()) {
                Ok(change) => {
                    debug!(
                        topic = %topic,
                        table = %change.table,
                        event = ?change.event,
                        "row change received"
                    );
                    Some(ChannelMessage::Change(change))
                }
                Err(e) => {
                    warn!(topic = %topic, error = %e, "malformed row change");
                    None
                }
            }
        }
        _ => {
            debug!(topic = %topic, event = %msg.event, "Unhandled Phoenix event");
            None
        }
    }
}
