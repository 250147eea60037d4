//! Full configuration validation.
//!
//! Each check pushes onto a shared error list; the orchestrator joins them
//! into a single `ConfigError`.

mod helpers;

#[cfg(test)]
mod tests;

use crate::schema::{IgameConfig, RetryStrategyKind};
use igame_common::ConfigError;

use helpers::{validate_range, validate_range_u64, validate_scheme};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &IgameConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_api(&mut errors, config);
    validate_realtime(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_api(errors: &mut Vec<String>, config: &IgameConfig) {
    validate_scheme(errors, "api.base_url", &config.api.base_url, &["http", "https"]);
    validate_range(
        errors,
        "api.connect_timeout_secs",
        config.api.connect_timeout_secs,
        1,
        60,
    );
    validate_range(
        errors,
        "api.request_timeout_secs",
        config.api.request_timeout_secs,
        1,
        300,
    );
}

fn validate_realtime(errors: &mut Vec<String>, config: &IgameConfig) {
    let rt = &config.realtime;
    if rt.is_enabled() {
        validate_scheme(errors, "realtime.url", &rt.url, &["http", "https", "ws", "wss"]);
        if rt.api_key.trim().is_empty() {
            errors.push("realtime.api_key is required when realtime.url is set".into());
        }
    }
    validate_range(errors, "realtime.heartbeat_interval", rt.heartbeat_interval, 5, 60);
    validate_range(
        errors,
        "realtime.connect_timeout_secs",
        rt.connect_timeout_secs,
        1,
        60,
    );
    validate_range_u64(errors, "realtime.retry.delay_ms", rt.retry.delay_ms, 100, 60_000);
    if rt.retry.strategy == RetryStrategyKind::Exponential && rt.retry.max_delay_ms < rt.retry.delay_ms
    {
        errors.push(format!(
            "realtime.retry.max_delay_ms = {} is below realtime.retry.delay_ms = {}",
            rt.retry.max_delay_ms, rt.retry.delay_ms
        ));
    }
}
