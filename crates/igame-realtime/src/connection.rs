//! Opening a channel over a WebSocket and pumping its messages.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::RealtimeError;
use crate::handler::translate;
use crate::types::{ChannelMessage, ChannelSpec, PhoenixMessage, RealtimeConfig, SubscribeStatus};

// ---------------------------------------------------------------------------
// Ref Counter
// ---------------------------------------------------------------------------

/// Monotonically increasing ref counter for Phoenix messages.
static REF_COUNTER: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_ref() -> String {
    REF_COUNTER.fetch_add(1, Ordering::Relaxed).to_string()
}

// ---------------------------------------------------------------------------
// Channel Stream
// ---------------------------------------------------------------------------

/// One live connection attempt for a channel.
///
/// Yields statuses and row changes until the channel fails or is closed.
/// Dropping the stream tears the connection down.
pub struct ChannelStream {
    rx: mpsc::Receiver<ChannelMessage>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ChannelStream {
    /// Wrap a receiver fed by some other transport.
    pub fn from_receiver(rx: mpsc::Receiver<ChannelMessage>) -> Self {
        Self {
            rx,
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    pub async fn next(&mut self) -> Option<ChannelMessage> {
        self.rx.recv().await
    }

    /// Leave the channel and wait for the connection task to finish.
    pub async fn close(mut self) {
        self.cancel.cancel();
        self.rx.close();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ChannelStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Opens channel connections. The subscriber calls this once per attempt.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    async fn open(&self, spec: &ChannelSpec) -> Result<ChannelStream, RealtimeError>;
}

// ---------------------------------------------------------------------------
// Phoenix Connector
// ---------------------------------------------------------------------------

/// Connects to a Supabase Realtime server; one socket per channel.
#[derive(Debug, Clone)]
pub struct PhoenixConnector {
    config: RealtimeConfig,
}

impl PhoenixConnector {
    pub fn new(config: RealtimeConfig) -> Self {
        Self { config }
    }
}

async fn send_phoenix<S>(ws_write: &mut S, msg: &PhoenixMessage) -> Result<(), RealtimeError>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: std::fmt::Display,
{
    let json = serde_json::to_string(msg).map_err(|e| RealtimeError::Protocol(e.to_string()))?;
    ws_write
        .send(WsMessage::Text(json.into()))
        .await
        .map_err(|e| RealtimeError::Send {
            event: msg.event.clone(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl ChannelConnector for PhoenixConnector {
    async fn open(&self, spec: &ChannelSpec) -> Result<ChannelStream, RealtimeError> {
        let url = self.config.ws_url();
        let timeout = Duration::from_secs(self.config.connect_timeout_secs);
        info!(
            url = %url.split('?').next().unwrap_or(""),
            channel = %spec.name,
            "Connecting to Supabase Realtime"
        );

        let (ws_stream, _) = match tokio::time::timeout(
            timeout,
            tokio_tungstenite::connect_async(&url),
        )
        .await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => return Err(RealtimeError::Connect(e.to_string())),
            Err(_elapsed) => return Err(RealtimeError::Timeout(timeout)),
        };

        let (mut ws_write, ws_read) = ws_stream.split();

        let topic = spec.topic();
        let join_ref = next_ref();
        let join = PhoenixMessage {
            topic: topic.clone(),
            event: "phx_join".to_string(),
            payload: spec.to_join_payload(self.config.access_token.as_deref()),
            msg_ref: Some(join_ref.clone()),
        };
        send_phoenix(&mut ws_write, &join).await?;

        let (tx, rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();
        let pump = ChannelPump {
            topic,
            join_ref,
            heartbeat: Duration::from_secs(self.config.heartbeat_interval_secs),
            join_timeout: timeout,
            tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(pump.run(ws_write, ws_read));

        Ok(ChannelStream {
            rx,
            cancel,
            task: Some(task),
        })
    }
}

// ---------------------------------------------------------------------------
// Pump
// ---------------------------------------------------------------------------

struct ChannelPump {
    topic: String,
    join_ref: String,
    heartbeat: Duration,
    join_timeout: Duration,
    tx: mpsc::Sender<ChannelMessage>,
    cancel: CancellationToken,
}

impl ChannelPump {
    async fn run<W, R>(self, mut ws_write: W, mut ws_read: R)
    where
        W: Sink<WsMessage> + Unpin,
        W::Error: std::fmt::Display,
        R: futures_util::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        let start = tokio::time::Instant::now();
        let mut heartbeat = tokio::time::interval_at(start + self.heartbeat, self.heartbeat);
        let join_deadline = tokio::time::sleep_until(start + self.join_timeout);
        tokio::pin!(join_deadline);
        let mut joined = false;

        let outcome = loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    let leave = PhoenixMessage {
                        topic: self.topic.clone(),
                        event: "phx_leave".to_string(),
                        payload: serde_json::json!({}),
                        msg_ref: Some(next_ref()),
                    };
                    let _ = send_phoenix(&mut ws_write, &leave).await;
                    let _ = ws_write.send(WsMessage::Close(None)).await;
                    debug!(topic = %self.topic, "left channel");
                    return;
                }

                _ = &mut join_deadline, if !joined => {
                    warn!(topic = %self.topic, "no join reply within {:?}", self.join_timeout);
                    break SubscribeStatus::TimedOut;
                }

                _ = heartbeat.tick() => {
                    let msg = PhoenixMessage {
                        topic: "phoenix".to_string(),
                        event: "heartbeat".to_string(),
                        payload: serde_json::json!({}),
                        msg_ref: Some(next_ref()),
                    };
                    if let Err(e) = send_phoenix(&mut ws_write, &msg).await {
                        break SubscribeStatus::ChannelError(e.to_string());
                    }
                }

                frame = ws_read.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        let Ok(msg) = serde_json::from_str::<PhoenixMessage>(&text) else {
                            debug!(text = %text.as_str(), "Unrecognized message from Supabase");
                            continue;
                        };
                        let Some(translated) = translate(&msg, &self.topic, &self.join_ref) else {
                            continue;
                        };
                        let failure = match &translated {
                            ChannelMessage::Status(SubscribeStatus::Subscribed) => {
                                joined = true;
                                None
                            }
                            ChannelMessage::Status(status) if status.is_failure() => Some(status.clone()),
                            _ => None,
                        };
                        if let Some(status) = failure {
                            break status;
                        }
                        if self.tx.send(translated).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!(topic = %self.topic, "Supabase Realtime closed connection");
                        break SubscribeStatus::Closed;
                    }
                    Some(Err(e)) => {
                        warn!(topic = %self.topic, error = %e, "WebSocket error");
                        break SubscribeStatus::ChannelError(e.to_string());
                    }
                    Some(Ok(_)) => {}
                },
            }
        };

        let _ = ws_write.send(WsMessage::Close(None)).await;
        let _ = self.tx.send(ChannelMessage::Status(outcome)).await;
    }
}
