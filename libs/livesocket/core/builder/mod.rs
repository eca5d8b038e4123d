pub mod states;

use crate::config::{
    ws_base_from_http, ManagerConfig, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_HEARTBEAT_PAYLOAD,
    DEFAULT_RETRY_COOLDOWN,
};
use crate::manager::ConnectionManager;
use crate::traits::*;
use crate::tungstenite::TungsteniteConnector;
use states::*;
use std::sync::Arc;
use std::time::Duration;

/// Type-state builder for ConnectionManager
///
/// This builder uses Rust's type system to enforce that the required
/// fields (base URL and token store) are set before the manager can be
/// built. Everything else has a default:
///
/// - connector: [`TungsteniteConnector`]
/// - heartbeat: `{"type":"ping"}` every 30 seconds
/// - reconnect strategy: [`LinearBackoff::default`] (1s steps, 5s cap, 5 attempts)
/// - retry cooldown: 30 seconds
pub struct ConnectionManagerBuilder<U, T>
where
    U: UrlState,
    T: TokenState,
{
    _state: TypeState<U, T>,
    base_url: Option<String>,
    token_store: Option<Arc<dyn TokenStore>>,
    connector: Option<Arc<dyn Connector>>,
    heartbeat: (Duration, String),
    reconnect_strategy: Option<Arc<dyn ReconnectionStrategy>>,
    retry_cooldown: Duration,
}

impl ConnectionManagerBuilder<NoUrl, NoTokenStore> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            base_url: None,
            token_store: None,
            connector: None,
            heartbeat: (DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_HEARTBEAT_PAYLOAD.to_string()),
            reconnect_strategy: None,
            retry_cooldown: DEFAULT_RETRY_COOLDOWN,
        }
    }
}

impl Default for ConnectionManagerBuilder<NoUrl, NoTokenStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U, T> ConnectionManagerBuilder<U, T>
where
    U: UrlState,
    T: TokenState,
{
    fn retype<NU: UrlState, NT: TokenState>(self) -> ConnectionManagerBuilder<NU, NT> {
        ConnectionManagerBuilder {
            _state: TypeState::new(),
            base_url: self.base_url,
            token_store: self.token_store,
            connector: self.connector,
            heartbeat: self.heartbeat,
            reconnect_strategy: self.reconnect_strategy,
            retry_cooldown: self.retry_cooldown,
        }
    }

    /// Transport used to open sockets
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Heartbeat interval and frame
    pub fn heartbeat(mut self, interval: Duration, payload: impl Into<String>) -> Self {
        self.heartbeat = (interval, payload.into());
        self
    }

    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Arc::new(strategy));
        self
    }

    /// How long an endpoint waits after exhausting its retries before the
    /// counter is reset
    pub fn retry_cooldown(mut self, cooldown: Duration) -> Self {
        self.retry_cooldown = cooldown;
        self
    }
}

// URL setting
impl<T> ConnectionManagerBuilder<NoUrl, T>
where
    T: TokenState,
{
    /// Base URL of the WebSocket server
    ///
    /// `http(s)://` URLs are converted to `ws(s)://`.
    pub fn base_url(mut self, url: impl AsRef<str>) -> ConnectionManagerBuilder<HasUrl, T> {
        self.base_url = Some(ws_base_from_http(url.as_ref()));
        self.retype()
    }
}

// Token store setting
impl<U> ConnectionManagerBuilder<U, NoTokenStore>
where
    U: UrlState,
{
    pub fn token_store(
        mut self,
        store: impl TokenStore + 'static,
    ) -> ConnectionManagerBuilder<U, HasTokenStore> {
        self.token_store = Some(Arc::new(store));
        self.retype()
    }
}

// Build - only available when URL and token store are set
impl ConnectionManagerBuilder<HasUrl, HasTokenStore> {
    /// Validate the configuration and create the manager
    ///
    /// Does not open any socket; call [`ConnectionManager::connect`] per endpoint.
    pub fn build(self) -> Result<ConnectionManager> {
        let base_url = self.base_url.unwrap_or_default();
        if !(base_url.starts_with("ws://") || base_url.starts_with("wss://")) {
            return Err(LiveSocketError::Configuration(format!(
                "base URL must use ws://, wss://, http:// or https://, got '{}'",
                base_url
            )));
        }

        let (heartbeat_interval, heartbeat_payload) = self.heartbeat;
        if heartbeat_interval.is_zero() {
            return Err(LiveSocketError::Configuration(
                "heartbeat interval must be greater than 0".to_string(),
            ));
        }

        let token_store = self.token_store.ok_or_else(|| {
            LiveSocketError::Configuration("token store is required".to_string())
        })?;

        let config = ManagerConfig {
            base_url,
            heartbeat_interval,
            heartbeat_payload,
            reconnect_strategy: self
                .reconnect_strategy
                .unwrap_or_else(|| Arc::new(LinearBackoff::default())),
            retry_cooldown: self.retry_cooldown,
        };

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(TungsteniteConnector::new()));

        Ok(ConnectionManager::new(config, token_store, connector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_converts_http_base() {
        let manager = ConnectionManagerBuilder::new()
            .base_url("https://api.example.com/")
            .token_store(MemoryTokenStore::new())
            .build()
            .unwrap();

        assert_eq!(manager.config().base_url(), "wss://api.example.com");
        assert_eq!(manager.config().heartbeat_payload(), r#"{"type":"ping"}"#);
    }

    #[test]
    fn build_rejects_unknown_scheme() {
        let result = ConnectionManagerBuilder::new()
            .token_store(MemoryTokenStore::new())
            .base_url("ftp://nope")
            .build();

        assert!(matches!(result, Err(LiveSocketError::Configuration(_))));
    }

    #[test]
    fn build_rejects_zero_heartbeat() {
        let result = ConnectionManagerBuilder::new()
            .base_url("ws://localhost:1")
            .token_store(MemoryTokenStore::new())
            .heartbeat(Duration::ZERO, "ping")
            .build();

        assert!(result.is_err());
    }
}
