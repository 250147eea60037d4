//! Tests for the full validation pipeline.

use super::*;
use crate::schema::*;

#[test]
fn default_config_validates() {
    let config = IgameConfig::default();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_bad_base_url_scheme() {
    let mut config = IgameConfig::default();
    config.api.base_url = "localhost:3000".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("api.base_url"));
}

#[test]
fn catches_request_timeout_zero() {
    let mut config = IgameConfig::default();
    config.api.request_timeout_secs = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("api.request_timeout_secs"));
}

#[test]
fn realtime_url_requires_key() {
    let mut config = IgameConfig::default();
    config.realtime.url = "https://proj.supabase.co".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("realtime.api_key"));

    config.realtime.api_key = "anon".into();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_bad_realtime_scheme() {
    let mut config = IgameConfig::default();
    config.realtime.url = "ftp://proj.supabase.co".into();
    config.realtime.api_key = "anon".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("realtime.url"));
}

#[test]
fn catches_heartbeat_out_of_range() {
    let mut config = IgameConfig::default();
    config.realtime.heartbeat_interval = 120;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("realtime.heartbeat_interval"));
}

#[test]
fn catches_exponential_cap_below_base() {
    let mut config = IgameConfig::default();
    config.realtime.retry.strategy = RetryStrategyKind::Exponential;
    config.realtime.retry.delay_ms = 5000;
    config.realtime.retry.max_delay_ms = 1000;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("realtime.retry.max_delay_ms"));
}

#[test]
fn collects_multiple_errors() {
    let mut config = IgameConfig::default();
    config.api.connect_timeout_secs = 0;
    config.realtime.retry.delay_ms = 1;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("api.connect_timeout_secs"));
    assert!(err.contains("realtime.retry.delay_ms"));
    assert!(err.contains("; "));
}
