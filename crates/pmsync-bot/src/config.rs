//! Application configuration.

use crate::error::{AppError, AppResult};
use pmsync_core::{ApiCredentials, TokenId};
use pmsync_scheduler::SchedulerConfig;
use pmsync_ws::{BackoffConfig, ChannelConfig, MARKET_WS_URL, USER_WS_URL};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Used when neither `--config` nor `PMSYNC_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

const CONFIG_ENV: &str = "PMSYNC_CONFIG";
const API_KEY_ENV: &str = "PMSYNC_API_KEY";
const API_SECRET_ENV: &str = "PMSYNC_API_SECRET";
const API_PASSPHRASE_ENV: &str = "PMSYNC_API_PASSPHRASE";

/// Streaming channel configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebsocketConfig {
    #[serde(default = "default_market_url")]
    pub market_url: String,
    #[serde(default = "default_user_url")]
    pub user_url: String,
    /// Ping interval (ms). Default: 5,000.
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,
    /// Re-check delay while no market tokens are known (ms). Default: 5,000.
    #[serde(default = "default_idle_wait_ms")]
    pub idle_wait_ms: u64,
    /// Opening handshake timeout (ms). Default: 10,000.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// First reconnect delay (ms). Default: 1,000.
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,
    /// Reconnect delay cap (ms). Default: 30,000.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// Consecutive failures before a channel gives up and the pair is
    /// restarted (0 = never).
    #[serde(default)]
    pub max_reconnect_attempts: u32,
}

fn default_market_url() -> String {
    MARKET_WS_URL.to_string()
}

fn default_user_url() -> String {
    USER_WS_URL.to_string()
}

fn default_keepalive_interval_ms() -> u64 {
    5_000
}

fn default_idle_wait_ms() -> u64 {
    5_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_backoff_initial_ms() -> u64 {
    1_000
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

impl Default for WebsocketConfig {
    fn default() -> Self {
        Self {
            market_url: default_market_url(),
            user_url: default_user_url(),
            keepalive_interval_ms: default_keepalive_interval_ms(),
            idle_wait_ms: default_idle_wait_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            max_reconnect_attempts: 0,
        }
    }
}

/// Refresh scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// Tick interval (ms). Default: 5,000.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// In-flight trade eviction age (ms). Default: 15,000.
    #[serde(default = "default_stale_timeout_ms")]
    pub stale_timeout_ms: u64,
}

fn default_tick_interval_ms() -> u64 {
    5_000
}

fn default_stale_timeout_ms() -> u64 {
    15_000
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            stale_timeout_ms: default_stale_timeout_ms(),
        }
    }
}

/// Markets to follow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketsConfig {
    /// Token ids subscribed on the market channel.
    #[serde(default)]
    pub tokens: Vec<String>,
}

/// File-provided credentials. Environment variables take precedence.
#[derive(Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default)]
    pub api_passphrase: Option<String>,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<redacted>" } else { "<unset>" };
        f.debug_struct("CredentialsConfig")
            .field("api_key", &mask(&self.api_key))
            .field("api_secret", &mask(&self.api_secret))
            .field("api_passphrase", &mask(&self.api_passphrase))
            .finish()
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub websocket: WebsocketConfig,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub markets: MarketsConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Path precedence: `cli_path` > `PMSYNC_CONFIG` > [`DEFAULT_CONFIG_PATH`].
    /// A missing file yields the defaults.
    pub fn load(cli_path: Option<&str>) -> AppResult<Self> {
        let config_path = cli_path
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let config = if Path::new(&config_path).exists() {
            tracing::info!(path = %config_path, "Loading configuration");
            Self::from_file(&config_path)?
        } else {
            warn!(path = %config_path, "Config file not found, using defaults");
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn validate(&self) -> AppResult<()> {
        let ws = &self.websocket;
        if ws.backoff_initial_ms == 0 {
            return Err(AppError::Config(
                "websocket.backoff_initial_ms must be positive".to_string(),
            ));
        }
        if ws.backoff_max_ms < ws.backoff_initial_ms {
            return Err(AppError::Config(format!(
                "websocket.backoff_max_ms ({}) is below backoff_initial_ms ({})",
                ws.backoff_max_ms, ws.backoff_initial_ms
            )));
        }
        if ws.keepalive_interval_ms == 0 || ws.idle_wait_ms == 0 || ws.connect_timeout_ms == 0 {
            return Err(AppError::Config(
                "websocket intervals must be positive".to_string(),
            ));
        }
        if self.scheduler.tick_interval_ms == 0 {
            return Err(AppError::Config(
                "scheduler.tick_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Configured market token ids.
    pub fn token_ids(&self) -> Vec<TokenId> {
        self.markets
            .tokens
            .iter()
            .map(|t| TokenId::new(t.as_str()))
            .collect()
    }

    pub fn market_channel(&self) -> ChannelConfig {
        self.channel("market", &self.websocket.market_url)
    }

    pub fn user_channel(&self) -> ChannelConfig {
        self.channel("user", &self.websocket.user_url)
    }

    fn channel(&self, name: &str, url: &str) -> ChannelConfig {
        let ws = &self.websocket;
        ChannelConfig {
            keepalive_interval: Duration::from_millis(ws.keepalive_interval_ms),
            idle_wait: Duration::from_millis(ws.idle_wait_ms),
            connect_timeout: Duration::from_millis(ws.connect_timeout_ms),
            backoff: BackoffConfig {
                initial: Duration::from_millis(ws.backoff_initial_ms),
                max: Duration::from_millis(ws.backoff_max_ms),
            },
            max_reconnect_attempts: ws.max_reconnect_attempts,
            ..ChannelConfig::new(name, url)
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_interval: Duration::from_millis(self.scheduler.tick_interval_ms),
            stale_timeout: Duration::from_millis(self.scheduler.stale_timeout_ms),
            ..SchedulerConfig::default()
        }
    }

    /// User channel credentials from the environment, falling back to the file.
    ///
    /// The values are passed through as-is. An incomplete set is only warned
    /// about: the server rejects the handshake and the channel backs off.
    pub fn credentials(&self) -> ApiCredentials {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    /// Same as [`credentials`](Self::credentials) with an explicit variable lookup.
    pub fn credentials_with<F>(&self, lookup: F) -> ApiCredentials
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = &self.credentials;
        let resolve = |env: &str, fallback: &Option<String>| {
            lookup(env)
                .filter(|v| !v.is_empty())
                .or_else(|| fallback.clone())
                .unwrap_or_default()
        };

        let credentials = ApiCredentials::new(
            resolve(API_KEY_ENV, &file.api_key),
            resolve(API_SECRET_ENV, &file.api_secret),
            resolve(API_PASSPHRASE_ENV, &file.api_passphrase),
        );
        if credentials.is_incomplete() {
            warn!(
                "User channel credentials incomplete, set {API_KEY_ENV}, {API_SECRET_ENV} and {API_PASSPHRASE_ENV}"
            );
        }
        credentials
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.websocket.market_url, MARKET_WS_URL);
        assert_eq!(config.websocket.backoff_max_ms, 30_000);
        assert_eq!(config.scheduler.stale_timeout_ms, 15_000);
        assert!(config.markets.tokens.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = AppConfig::from_toml(
            r#"
            [websocket]
            market_url = "ws://localhost:9000/ws/market"
            max_reconnect_attempts = 5

            [markets]
            tokens = ["111", "222"]
            "#,
        )
        .unwrap();

        assert_eq!(config.websocket.market_url, "ws://localhost:9000/ws/market");
        assert_eq!(config.websocket.user_url, USER_WS_URL);
        assert_eq!(config.websocket.keepalive_interval_ms, 5_000);
        assert_eq!(config.scheduler.tick_interval_ms, 5_000);
        assert_eq!(config.token_ids(), vec![TokenId::new("111"), TokenId::new("222")]);

        let market = config.market_channel();
        assert_eq!(market.name, "market");
        assert_eq!(market.max_reconnect_attempts, 5);
        assert_eq!(market.backoff.initial, Duration::from_secs(1));
        assert_eq!(config.user_channel().url, USER_WS_URL);
    }

    #[test]
    fn test_invalid_toml() {
        let err = AppConfig::from_toml("[websocket\nmarket_url = 1").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_inverted_backoff() {
        let mut config = AppConfig::default();
        config.websocket.backoff_initial_ms = 5_000;
        config.websocket.backoff_max_ms = 1_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scheduler_config() {
        let mut config = AppConfig::default();
        config.scheduler.tick_interval_ms = 250;
        let scheduler = config.scheduler_config();
        assert_eq!(scheduler.tick_interval, Duration::from_millis(250));
        assert_eq!(scheduler.stale_timeout, Duration::from_secs(15));
        assert_eq!(scheduler.markets_every_ticks, 6);
    }

    #[test]
    fn test_credentials_env_overrides_file() {
        let config = AppConfig::from_toml(
            r#"
            [credentials]
            api_key = "file-key"
            api_secret = "file-secret"
            api_passphrase = "file-pass"
            "#,
        )
        .unwrap();
        let env: HashMap<&str, &str> = [(API_KEY_ENV, "env-key")].into_iter().collect();

        let creds = config
            .credentials_with(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(creds.api_key(), "env-key");
        assert_eq!(creds.secret(), "file-secret");
        assert_eq!(creds.passphrase(), "file-pass");
    }

    #[test]
    fn test_missing_credentials_are_passed_through() {
        let creds = AppConfig::default().credentials_with(|_| None);
        assert!(creds.is_incomplete());
        assert_eq!(creds.api_key(), "");

        let env: HashMap<&str, &str> = [(API_KEY_ENV, "only-key")].into_iter().collect();
        let creds = AppConfig::default().credentials_with(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(creds.api_key(), "only-key");
        assert_eq!(creds.passphrase(), "");
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let config = AppConfig::from_toml("[credentials]\napi_secret = \"hunter2\"").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load(Some("/nonexistent/pmsync.toml")).unwrap();
        assert_eq!(config.websocket.idle_wait_ms, 5_000);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("pmsync-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[scheduler]\nstale_timeout_ms = 20000\n").unwrap();

        let config = AppConfig::load(path.to_str()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.scheduler.stale_timeout_ms, 20_000);
    }
}
