//! Environment variable overrides.
//!
//! Each setting accepts an `IGAME_*` name first and falls back to the
//! variable names used by the web deployment (`API_BASE_URL`,
//! `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `ENABLE_LOGS`). A `.env` file
//! may supply the same names; the process environment wins over it.

use std::collections::HashMap;
use std::path::Path;

use igame_common::ConfigError;
use tracing::{debug, warn};

use crate::schema::IgameConfig;

const API_BASE_URL: [&str; 2] = ["IGAME_API_BASE_URL", "API_BASE_URL"];
const REALTIME_URL: [&str; 2] = ["IGAME_REALTIME_URL", "SUPABASE_URL"];
const REALTIME_KEY: [&str; 2] = ["IGAME_REALTIME_KEY", "SUPABASE_ANON_KEY"];
const ENABLE_LOGS: [&str; 2] = ["IGAME_ENABLE_LOGS", "ENABLE_LOGS"];

/// Whether the overrides read `name`.
pub fn is_known_var(name: &str) -> bool {
    [API_BASE_URL, REALTIME_URL, REALTIME_KEY, ENABLE_LOGS]
        .iter()
        .any(|names| names.contains(&name))
}

/// Override values read from a `.env` file. Names the overrides do not
/// read are dropped.
#[derive(Debug, Clone, Default)]
pub struct DotEnv {
    vars: HashMap<String, String>,
}

impl DotEnv {
    /// Look for `.env` in the working directory and its parents.
    pub fn discover() -> Self {
        match dotenvy::dotenv_iter() {
            Ok(iter) => Self::collect(iter),
            Err(e) if e.not_found() => Self::default(),
            Err(e) => {
                warn!("ignoring unreadable .env: {e}");
                Self::default()
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::from_path_iter(path)
            .map(Self::collect)
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))
    }

    fn collect<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<(String, String), dotenvy::Error>>,
    {
        let mut vars = HashMap::new();
        for item in iter {
            match item {
                Ok((key, value)) if is_known_var(&key) => {
                    vars.insert(key, value);
                }
                Ok((key, _)) => debug!(key = %key, "skipping unused .env entry"),
                Err(e) => warn!("skipping malformed .env line: {e}"),
            }
        }
        debug!(vars = vars.len(), "loaded .env");
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

fn first_set(lookup: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
}

/// Apply overrides read through `lookup`.
pub fn apply_env_overrides(config: &mut IgameConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = first_set(&lookup, &API_BASE_URL) {
        debug!(base_url = %url, "api.base_url overridden from environment");
        config.api.base_url = url;
    }
    if let Some(url) = first_set(&lookup, &REALTIME_URL) {
        debug!(url = %url, "realtime.url overridden from environment");
        config.realtime.url = url;
    }
    if let Some(key) = first_set(&lookup, &REALTIME_KEY) {
        config.realtime.api_key = key;
    }
    if let Some(flag) = first_set(&lookup, &ENABLE_LOGS) {
        config.logging.verbose = flag.trim().eq_ignore_ascii_case("true");
    }
}

/// Apply overrides from the process environment, falling back to
/// `dotenv` for names the process leaves unset.
pub fn apply_process_env(config: &mut IgameConfig, dotenv: &DotEnv) {
    apply_env_overrides(config, |name| {
        std::env::var(name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| dotenv.get(name))
    });
}
