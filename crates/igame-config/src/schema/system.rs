//! System configuration types: logging and client-side storage.

use serde::{Deserialize, Serialize};

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct LoggingConfig {
    /// Verbose client logging; forces `debug` for igame crates.
    pub verbose: bool,
    pub level: LogLevel,
}

impl LoggingConfig {
    /// The `tracing_subscriber::EnvFilter` directive for igame crates.
    pub fn directive(&self) -> String {
        let level = if self.verbose {
            LogLevel::Debug
        } else {
            self.level
        };
        format!("igame={}", level.as_str())
    }
}

/// Persistent client-side storage (cached user, cookies).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// When false, nothing is persisted between runs.
    pub enabled: bool,
    /// Storage file override. Defaults to `<data_dir>/igame/storage.json`.
    pub path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}
