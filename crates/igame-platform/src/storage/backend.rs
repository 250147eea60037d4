//! Key/value storage backends.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use igame_common::PlatformError;
use tracing::{debug, warn};

/// String key/value persistence.
pub trait StorageBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, PlatformError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), PlatformError>;
    fn remove_item(&self, key: &str) -> Result<(), PlatformError>;
}

// ---------------------------------------------------------------------------
// File storage
// ---------------------------------------------------------------------------

/// Stores all keys in one JSON object file.
///
/// Writes go to a sibling temp file that is then renamed over the target.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, PlatformError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(PlatformError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            PlatformError::Storage(format!("corrupt storage file {}: {e}", self.path.display()))
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), PlatformError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PlatformError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| PlatformError::Storage(format!("failed to serialize storage: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| PlatformError::Storage(format!("failed to write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            PlatformError::Storage(format!("failed to replace {}: {e}", self.path.display()))
        })
    }

    /// Read the map for an update. A corrupt file is discarded so that the
    /// write can still go through.
    fn read_map_for_update(&self) -> Result<BTreeMap<String, String>, PlatformError> {
        match self.read_map() {
            Err(PlatformError::Storage(msg)) if msg.starts_with("corrupt") => {
                warn!("{msg}; starting from an empty store");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, PlatformError> {
        self.lock
            .lock()
            .map_err(|_| PlatformError::Storage("storage lock poisoned".into()))
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PlatformError> {
        let _guard = self.guard()?;
        Ok(self.read_map()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PlatformError> {
        let _guard = self.guard()?;
        let mut map = self.read_map_for_update()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)?;
        debug!(key, "storage item set");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), PlatformError> {
        let _guard = self.guard()?;
        let mut map = self.read_map_for_update()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
            debug!(key, "storage item removed");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Memory storage
// ---------------------------------------------------------------------------

/// Process-local storage; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, PlatformError> {
        self.items
            .lock()
            .map_err(|_| PlatformError::Storage("storage lock poisoned".into()))
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PlatformError> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PlatformError> {
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), PlatformError> {
        self.items()?.remove(key);
        Ok(())
    }
}
