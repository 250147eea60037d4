//! Channel subscriptions with reconnect.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connection::ChannelConnector;
use crate::retry::RetryPolicy;
use crate::types::{ChangeEvent, ChangeFilter, ChannelMessage, ChannelSpec, RowChange, SubscribeStatus};

pub(crate) type ChangeHandler = Arc<dyn Fn(&RowChange) + Send + Sync>;
pub(crate) type StatusHandler = Arc<dyn Fn(&SubscribeStatus) + Send + Sync>;

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects handlers for a channel before subscribing.
///
/// Obtained from [`RealtimeClient::channel`](crate::RealtimeClient::channel).
pub struct ChannelBuilder {
    connector: Arc<dyn ChannelConnector>,
    policy: RetryPolicy,
    subscribed: Arc<AtomicUsize>,
    spec: ChannelSpec,
    handlers: Vec<(ChangeFilter, ChangeHandler)>,
    on_status: Option<StatusHandler>,
}

impl ChannelBuilder {
    pub(crate) fn new(
        connector: Arc<dyn ChannelConnector>,
        policy: RetryPolicy,
        subscribed: Arc<AtomicUsize>,
        name: &str,
    ) -> Self {
        Self {
            connector,
            policy,
            subscribed,
            spec: ChannelSpec::new(name),
            handlers: Vec::new(),
            on_status: None,
        }
    }

    /// Run `handler` for every row change matching `filter`.
    pub fn on_change<F>(mut self, filter: ChangeFilter, handler: F) -> Self
    where
        F: Fn(&RowChange) + Send + Sync + 'static,
    {
        self.spec.filters.push(filter.clone());
        self.handlers.push((filter, Arc::new(handler)));
        self
    }

    pub fn on_insert<F>(self, table: &str, handler: F) -> Self
    where
        F: Fn(&RowChange) + Send + Sync + 'static,
    {
        self.on_change(ChangeFilter::new(ChangeEvent::Insert, table), handler)
    }

    pub fn on_delete<F>(self, table: &str, handler: F) -> Self
    where
        F: Fn(&RowChange) + Send + Sync + 'static,
    {
        self.on_change(ChangeFilter::new(ChangeEvent::Delete, table), handler)
    }

    pub fn on_status<F>(mut self, handler: F) -> Self
    where
        F: Fn(&SubscribeStatus) + Send + Sync + 'static,
    {
        self.on_status = Some(Arc::new(handler));
        self
    }

    /// Override the client's retry policy for this channel.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn spec(&self) -> &ChannelSpec {
        &self.spec
    }

    /// Start the subscription on a background task. Must be called inside
    /// a tokio runtime.
    pub fn subscribe(self) -> SubscriptionHandle {
        let cancel = CancellationToken::new();
        let name = self.spec.name.clone();
        let supervisor = Supervisor {
            connector: self.connector,
            policy: self.policy,
            subscribed: self.subscribed,
            spec: self.spec,
            handlers: self.handlers,
            on_status: self.on_status,
            cancel: cancel.clone(),
        };
        info!(channel = %name, "Subscribing to channel");
        let task = tokio::spawn(supervisor.run());
        SubscriptionHandle {
            name,
            cancel,
            task: Some(task),
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Owns a running subscription. Dropping it cancels the subscription and
/// any pending reconnect.
#[derive(Debug)]
pub struct SubscriptionHandle {
    name: String,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the subscription has stopped (unsubscribed or gave up).
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Leave the channel, cancel any pending reconnect, and wait for the
    /// background task to exit.
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(channel = %self.name, error = %e, "subscription task failed");
            }
        }
        debug!(channel = %self.name, "unsubscribed");
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

struct Supervisor {
    connector: Arc<dyn ChannelConnector>,
    policy: RetryPolicy,
    subscribed: Arc<AtomicUsize>,
    spec: ChannelSpec,
    handlers: Vec<(ChangeFilter, ChangeHandler)>,
    on_status: Option<StatusHandler>,
    cancel: CancellationToken,
}

/// How one connection attempt ended.
enum Attempt {
    Failed,
    Cancelled,
}

impl Supervisor {
    fn report(&self, status: &SubscribeStatus) {
        debug!(channel = %self.spec.name, %status, "Subscribe status");
        if let Some(handler) = &self.on_status {
            handler(status);
        }
    }

    fn dispatch(&self, change: &RowChange) {
        for (filter, handler) in &self.handlers {
            if filter.matches(change) {
                handler(change);
            }
        }
    }

    async fn run(self) {
        let mut attempt: u32 = 0;

        loop {
            match self.connect_once(&mut attempt).await {
                Attempt::Cancelled => break,
                Attempt::Failed => {}
            }

            attempt = attempt.saturating_add(1);
            let Some(delay) = self.policy.next_delay(attempt) else {
                warn!(channel = %self.spec.name, attempts = attempt, "giving up on channel");
                self.report(&SubscribeStatus::GaveUp);
                break;
            };

            info!(
                channel = %self.spec.name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Channel reported closed, scheduling reconnect"
            );
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn connect_once(&self, attempt: &mut u32) -> Attempt {
        let opened = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Attempt::Cancelled,
            opened = self.connector.open(&self.spec) => opened,
        };

        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                warn!(channel = %self.spec.name, error = %e, "Error while subscribing to channel");
                self.report(&SubscribeStatus::ChannelError(e.to_string()));
                return Attempt::Failed;
            }
        };

        let mut is_subscribed = false;
        let outcome = loop {
            let msg = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break Attempt::Cancelled,
                msg = stream.next() => msg,
            };
            match msg {
                Some(ChannelMessage::Status(SubscribeStatus::Subscribed)) => {
                    *attempt = 0;
                    if !is_subscribed {
                        is_subscribed = true;
                        self.subscribed.fetch_add(1, Ordering::Relaxed);
                    }
                    self.report(&SubscribeStatus::Subscribed);
                }
                Some(ChannelMessage::Status(status)) => {
                    self.report(&status);
                    if status.is_failure() {
                        break Attempt::Failed;
                    }
                }
                Some(ChannelMessage::Change(change)) => self.dispatch(&change),
                None => {
                    self.report(&SubscribeStatus::Closed);
                    break Attempt::Failed;
                }
            }
        };

        if is_subscribed {
            self.subscribed.fetch_sub(1, Ordering::Relaxed);
        }
        stream.close().await;
        outcome
    }
}
