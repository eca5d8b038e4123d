//! Dashboard configuration
//!
//! Loaded from YAML, then overridden from the environment (after `.env`)
//! and validated.

use livesocket::{ws_base_from_http, LinearBackoff};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Environment variables that override YAML values
pub const ENV_API_BASE_URL: &str = "API_BASE_URL";
pub const ENV_WS_BASE_URL: &str = "WS_BASE_URL";
pub const ENV_TOKEN_FILE: &str = "TOKEN_FILE";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Main dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// REST base URL, e.g. `https://api.example.com`
    pub api_base_url: String,

    /// Explicit WebSocket base; derived from `api_base_url` when absent
    #[serde(default)]
    pub ws_base_url: Option<String>,

    /// JSON file holding `{"token": "..."}`
    #[serde(default = "default_token_file")]
    pub token_file: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub connection: ConnectionConfig,
}

/// Session binder endpoints and timings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub deposits_endpoint: String,
    pub notifications_endpoint: String,
    pub base_delay_ms: u64,
    pub rotation_delay_ms: u64,
    pub hydration_delay_ms: u64,
    pub reconnect_delay_ms: u64,
    pub token_poll_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            deposits_endpoint: "admin/deposits".to_string(),
            notifications_endpoint: "notifications".to_string(),
            base_delay_ms: 300,
            rotation_delay_ms: 500,
            hydration_delay_ms: 800,
            reconnect_delay_ms: 2000,
            token_poll_interval_ms: 1000,
        }
    }
}

impl SessionConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn rotation_delay(&self) -> Duration {
        Duration::from_millis(self.rotation_delay_ms)
    }

    pub fn hydration_delay(&self) -> Duration {
        Duration::from_millis(self.hydration_delay_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn token_poll_interval(&self) -> Duration {
        Duration::from_millis(self.token_poll_interval_ms)
    }

    /// Endpoints the binder keeps connected
    pub fn endpoints(&self) -> [&str; 2] {
        [&self.deposits_endpoint, &self.notifications_endpoint]
    }
}

/// Connection manager tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub heartbeat_interval_secs: u64,
    pub retry_step_ms: u64,
    pub retry_max_delay_ms: u64,
    pub max_retries: u32,
    pub retry_cooldown_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 30,
            retry_step_ms: 1000,
            retry_max_delay_ms: 5000,
            max_retries: 5,
            retry_cooldown_secs: 30,
        }
    }
}

impl ConnectionConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn retry_cooldown(&self) -> Duration {
        Duration::from_secs(self.retry_cooldown_secs)
    }

    pub fn reconnect_strategy(&self) -> LinearBackoff {
        LinearBackoff::new(
            Duration::from_millis(self.retry_step_ms),
            Duration::from_millis(self.retry_max_delay_ms),
            self.max_retries,
        )
    }
}

fn default_token_file() -> String {
    "token.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DashboardConfig {
    /// Load configuration from a YAML file and the environment
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config = Self::from_yaml(&yaml_content)?;

        // Don't fail if .env doesn't exist
        dotenv::dotenv().ok();
        config.apply_overrides(|key| std::env::var(key).ok());

        config.validate()?;
        Ok(config)
    }

    /// Parse YAML without environment overrides or validation
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Replace values for which `lookup` returns a non-empty string
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(url) = lookup(ENV_WS_BASE_URL) {
            self.ws_base_url = Some(url);
        }
        if let Some(path) = lookup(ENV_TOKEN_FILE) {
            self.token_file = path;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
    }

    /// WebSocket base URL: the explicit override, else derived from the REST base
    pub fn ws_base(&self) -> String {
        match &self.ws_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => ws_base_from_http(&self.api_base_url),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(
                "api_base_url must start with http:// or https://".to_string(),
            ));
        }

        if let Some(ws) = &self.ws_base_url {
            if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
                return Err(ConfigError::ValidationError(
                    "ws_base_url must start with ws:// or wss://".to_string(),
                ));
            }
        }

        if self.token_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "token_file must not be empty".to_string(),
            ));
        }

        let session = &self.session;
        for endpoint in session.endpoints() {
            if endpoint.is_empty() || endpoint.starts_with('/') || endpoint.ends_with('/') {
                return Err(ConfigError::ValidationError(format!(
                    "invalid endpoint name {:?}",
                    endpoint
                )));
            }
        }
        if session.deposits_endpoint == session.notifications_endpoint {
            return Err(ConfigError::ValidationError(
                "deposits and notifications endpoints must differ".to_string(),
            ));
        }
        if session.token_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "token_poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        let connection = &self.connection;
        if connection.heartbeat_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "heartbeat_interval_secs must be greater than 0".to_string(),
            ));
        }
        if connection.retry_step_ms > connection.retry_max_delay_ms {
            return Err(ConfigError::ValidationError(
                "retry_step_ms must be <= retry_max_delay_ms".to_string(),
            ));
        }

        Ok(())
    }
}
