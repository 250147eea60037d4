//! Public handle for opening realtime channels.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::connection::{ChannelConnector, PhoenixConnector};
use crate::retry::RetryPolicy;
use crate::subscriber::ChannelBuilder;
use crate::types::RealtimeConfig;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Entry point for channel subscriptions.
///
/// Constructed once by the application and handed to whatever needs
/// push updates. Cloning is cheap and clones share the connector.
#[derive(Clone)]
pub struct RealtimeClient {
    connector: Arc<dyn ChannelConnector>,
    policy: RetryPolicy,
    subscribed: Arc<AtomicUsize>,
}

impl RealtimeClient {
    /// Client backed by a Supabase Realtime server.
    pub fn new(config: RealtimeConfig, policy: RetryPolicy) -> Self {
        Self::with_connector(Arc::new(PhoenixConnector::new(config)), policy)
    }

    /// Client backed by a custom transport.
    pub fn with_connector(connector: Arc<dyn ChannelConnector>, policy: RetryPolicy) -> Self {
        Self {
            connector,
            policy,
            subscribed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Start configuring a channel named `name`.
    pub fn channel(&self, name: &str) -> ChannelBuilder {
        ChannelBuilder::new(
            Arc::clone(&self.connector),
            self.policy,
            Arc::clone(&self.subscribed),
            name,
        )
    }

    /// Whether at least one channel is currently subscribed.
    pub fn is_connected(&self) -> bool {
        self.subscribed.load(Ordering::Relaxed) > 0
    }
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("policy", &self.policy)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
