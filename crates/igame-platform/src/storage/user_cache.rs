//! Client-side cache of the logged-in user.

use std::sync::Arc;

use igame_common::{PlatformError, User};
use tracing::{debug, error};

use super::backend::StorageBackend;

/// Storage key holding the serialized current user.
pub const CURRENT_USER_KEY: &str = "current_user";

/// Persists, retrieves and clears the current user record.
///
/// Without a backend every operation is a no-op. `set`, `get` and `remove`
/// never fail: storage problems are logged and swallowed. The `try_*`
/// variants report them instead.
#[derive(Clone)]
pub struct UserCache {
    backend: Option<Arc<dyn StorageBackend>>,
}

impl UserCache {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A cache with no persistent storage behind it.
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&self) -> Result<&Arc<dyn StorageBackend>, PlatformError> {
        self.backend.as_ref().ok_or(PlatformError::StorageUnavailable)
    }

    pub fn try_set(&self, user: &User) -> Result<(), PlatformError> {
        let json = serde_json::to_string(user)
            .map_err(|e| PlatformError::Storage(format!("failed to serialize user: {e}")))?;
        self.backend()?.set_item(CURRENT_USER_KEY, &json)
    }

    /// `Ok(None)` when nothing is stored; an error when the entry is malformed.
    pub fn try_get(&self) -> Result<Option<User>, PlatformError> {
        let Some(raw) = self.backend()?.get_item(CURRENT_USER_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| PlatformError::Storage(format!("malformed cached user: {e}")))
    }

    pub fn try_remove(&self) -> Result<(), PlatformError> {
        self.backend()?.remove_item(CURRENT_USER_KEY)
    }

    pub fn set(&self, user: &User) {
        if !self.is_available() {
            return;
        }
        match self.try_set(user) {
            Ok(()) => debug!(username = %user.username, "cached current user"),
            Err(e) => error!("Failed to set current user in storage: {e}"),
        }
    }

    pub fn get(&self) -> Option<User> {
        if !self.is_available() {
            return None;
        }
        self.try_get().unwrap_or_else(|e| {
            error!("Failed to get current user from storage: {e}");
            None
        })
    }

    pub fn remove(&self) {
        if !self.is_available() {
            return;
        }
        if let Err(e) = self.try_remove() {
            error!("Failed to remove current user from storage: {e}");
        }
    }
}

impl std::fmt::Debug for UserCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCache")
            .field("available", &self.is_available())
            .finish()
    }
}
