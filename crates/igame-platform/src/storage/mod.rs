//! Persistent client-side storage.
//!
//! A small key/value store in the spirit of browser `localStorage`, plus the
//! typed [`UserCache`] built on top of it.

mod backend;
mod user_cache;

pub use backend::{FileStorage, MemoryStorage, StorageBackend};
pub use user_cache::{UserCache, CURRENT_USER_KEY};
