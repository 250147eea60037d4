//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# iGame client configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.
# Environment overrides: IGAME_API_BASE_URL, IGAME_REALTIME_URL,
# IGAME_REALTIME_KEY, IGAME_ENABLE_LOGS.

[api]
base_url = "http://localhost:3000"
# connect_timeout_secs = 10   # 1-60
# request_timeout_secs = 30   # 1-300

[realtime]
# url = "https://your-project.supabase.co"   # empty disables live updates
# api_key = ""
# heartbeat_interval = 25     # 5-60
# connect_timeout_secs = 15   # 1-60

[realtime.retry]
# strategy = "fixed"          # fixed, exponential
# delay_ms = 2000             # 100-60000
# max_delay_ms = 30000
# max_attempts = 10           # 0 = retry forever

[logging]
# verbose = false
# level = "info"              # trace, debug, info, warn, error

[storage]
# enabled = true
# path = "/custom/path/storage.json"
"##
    .to_string()
}
