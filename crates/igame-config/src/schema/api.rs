//! Backend API configuration.

use serde::{Deserialize, Serialize};

/// Where and how to reach the game backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Origin serving the `/api/*` routes.
    pub base_url: String,
    /// TCP connect timeout in seconds (valid range: 1-60).
    pub connect_timeout_secs: u32,
    /// Whole-request timeout in seconds (valid range: 1-300).
    pub request_timeout_secs: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}
