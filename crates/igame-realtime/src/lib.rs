//! Supabase Realtime change-feed client over the Phoenix Channels v1 protocol.
//!
//! A [`RealtimeClient`] opens named channels filtered to row changes on
//! given tables. Each subscription runs on its own task, dispatches
//! `INSERT`/`DELETE` rows to registered handlers, and reconnects after a
//! failure as dictated by its [`RetryPolicy`].

mod client;
mod connection;
mod error;
mod handler;
mod retry;
mod subscriber;
mod types;

pub use client::RealtimeClient;
pub use connection::{ChannelConnector, ChannelStream, PhoenixConnector};
pub use error::RealtimeError;
pub use retry::{DelayStrategy, RetryPolicy};
pub use subscriber::{ChannelBuilder, SubscriptionHandle};
pub use types::{
    ChangeEvent, ChangeFilter, ChannelMessage, ChannelSpec, PhoenixMessage, RealtimeConfig,
    RowChange, SubscribeStatus,
};
