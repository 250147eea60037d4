//! Platform services for the iGame client: directory layout and
//! persistent client-side storage.

pub mod paths;
pub mod storage;

pub use storage::{FileStorage, MemoryStorage, StorageBackend, UserCache, CURRENT_USER_KEY};
