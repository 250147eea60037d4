//! Configuration schema types for the iGame client.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod api;
mod realtime;
mod system;

pub use api::*;
pub use realtime::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgameConfig {
    pub api: ApiConfig,
    pub realtime: RealtimeSchemaConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
}

// =============================================================================
// Tests
// =============================================================================
