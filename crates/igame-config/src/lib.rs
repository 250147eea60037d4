//! iGame client configuration.
//!
//! TOML-based configuration with environment overrides and validation.
//! Every section uses serde defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use igame_config::{load_config, config_to_json};
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use env::{apply_env_overrides, apply_process_env, DotEnv};
pub use schema::{
    ApiConfig, IgameConfig, LogLevel, LoggingConfig, RealtimeSchemaConfig, RetrySchemaConfig,
    RetryStrategyKind, StorageConfig, CONFIG_SCHEMA_VERSION,
};

use std::path::Path;

use igame_common::ConfigError;

/// Load the effective config.
///
/// Reads `path` when given, otherwise `config.toml` from the OS config
/// directory (creating a documented default if none exists). Environment
/// overrides, including any found in a `.env` file, are applied last, then
/// the result is validated.
pub fn load_config(path: Option<&Path>) -> Result<IgameConfig, ConfigError> {
    load_config_with(path, &DotEnv::discover())
}

/// [`load_config`] with an explicit `.env` source.
pub fn load_config_with(path: Option<&Path>, dotenv: &DotEnv) -> Result<IgameConfig, ConfigError> {
    let mut config = match path {
        Some(p) => toml_loader::load_from_path(p)?,
        None => toml_loader::load_default()?,
    };

    apply_process_env(&mut config, dotenv);
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &IgameConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
