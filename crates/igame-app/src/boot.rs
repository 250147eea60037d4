//! Start-up wiring: storage, cookies, the API client and realtime.

use std::sync::Arc;
use std::time::Duration;

use igame_api::{AuthGateway, CookieJar, GameApi, GatewayConfig, GatewayError};
use igame_common::PlatformError;
use igame_config::{IgameConfig, RetrySchemaConfig, RetryStrategyKind};
use igame_platform::{FileStorage, StorageBackend, UserCache};
use igame_realtime::{RealtimeClient, RealtimeConfig, RetryPolicy};
use tracing::{debug, info, warn};

/// Storage key holding the cookie jar between runs.
pub const COOKIES_KEY: &str = "cookies";

/// Everything a command needs, built once from the config.
pub struct AppContext {
    pub config: IgameConfig,
    pub api: GameApi,
    pub cache: UserCache,
    pub realtime: Option<RealtimeClient>,
    jar: Arc<CookieJar>,
    storage: Option<Arc<dyn StorageBackend>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("storage error: {0}")]
    Storage(#[from] PlatformError),

    #[error("http client error: {0}")]
    Gateway(#[from] GatewayError),
}

impl AppContext {
    pub fn boot(config: IgameConfig, token: Option<String>) -> Result<Self, BootError> {
        let storage = open_storage(&config)?;
        let cache = match &storage {
            Some(backend) => UserCache::new(Arc::clone(backend)),
            None => UserCache::disabled(),
        };

        let jar = Arc::new(restore_cookies(storage.as_deref()));
        let gateway = AuthGateway::new(gateway_config(&config), Arc::clone(&jar))?;
        let mut api = GameApi::new(gateway);
        if let Some(token) = token {
            api = api.with_token(token);
        }

        let realtime = if config.realtime.is_enabled() {
            let access_token = api
                .token()
                .map(str::to_string)
                .or_else(|| api.gateway().access_token());
            let realtime_config = RealtimeConfig {
                url: config.realtime.url.clone(),
                api_key: config.realtime.api_key.clone(),
                access_token,
                heartbeat_interval_secs: u64::from(config.realtime.heartbeat_interval),
                connect_timeout_secs: u64::from(config.realtime.connect_timeout_secs),
            };
            info!(url = %realtime_config.url, "realtime enabled");
            Some(RealtimeClient::new(
                realtime_config,
                retry_policy(&config.realtime.retry),
            ))
        } else {
            debug!("realtime not configured; live updates disabled");
            None
        };

        Ok(Self {
            config,
            api,
            cache,
            realtime,
            jar,
            storage,
        })
    }

    /// Persist the cookie jar for the next run.
    pub fn save_cookies(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let result = if self.jar.is_empty() {
            storage.remove_item(COOKIES_KEY)
        } else {
            match self.jar.to_json() {
                Ok(json) => storage.set_item(COOKIES_KEY, &json),
                Err(e) => Err(PlatformError::Storage(e.to_string())),
            }
        };
        match result {
            Ok(()) => debug!(empty = self.jar.is_empty(), "cookies saved"),
            Err(e) => warn!("Failed to save cookies: {e}"),
        }
    }
}

fn open_storage(config: &IgameConfig) -> Result<Option<Arc<dyn StorageBackend>>, PlatformError> {
    if !config.storage.enabled {
        info!("storage disabled; nothing is kept between runs");
        return Ok(None);
    }
    let path = match &config.storage.path {
        Some(p) => p.into(),
        None => {
            igame_platform::paths::ensure_dirs()?;
            igame_platform::paths::storage_file()?
        }
    };
    debug!(path = %path.display(), "using file storage");
    Ok(Some(Arc::new(FileStorage::new(path))))
}

/// Cookies saved by a previous run, or an empty jar.
fn restore_cookies(storage: Option<&dyn StorageBackend>) -> CookieJar {
    let Some(storage) = storage else {
        return CookieJar::new();
    };
    match storage.get_item(COOKIES_KEY) {
        Ok(Some(raw)) => match CookieJar::from_json(&raw) {
            Ok(jar) => jar,
            Err(e) => {
                warn!("Ignoring malformed saved cookies: {e}");
                CookieJar::new()
            }
        },
        Ok(None) => CookieJar::new(),
        Err(e) => {
            warn!("Failed to read saved cookies: {e}");
            CookieJar::new()
        }
    }
}

pub fn gateway_config(config: &IgameConfig) -> GatewayConfig {
    GatewayConfig {
        base_url: config.api.base_url.clone(),
        connect_timeout: Duration::from_secs(u64::from(config.api.connect_timeout_secs)),
        request_timeout: Duration::from_secs(u64::from(config.api.request_timeout_secs)),
    }
}

/// `max_attempts = 0` retries forever.
pub fn retry_policy(retry: &RetrySchemaConfig) -> RetryPolicy {
    let max_attempts = (retry.max_attempts > 0).then_some(retry.max_attempts);
    let delay = Duration::from_millis(retry.delay_ms);
    match retry.strategy {
        RetryStrategyKind::Fixed => RetryPolicy::fixed(delay, max_attempts),
        RetryStrategyKind::Exponential => RetryPolicy::exponential(
            delay,
            Duration::from_millis(retry.max_delay_ms),
            max_attempts,
        ),
    }
}
