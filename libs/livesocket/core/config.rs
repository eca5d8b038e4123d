use crate::traits::*;
use std::sync::Arc;
use std::time::Duration;

/// Close code for an intentional, caller-initiated disconnect.
/// Sockets closed with this code are never reconnected automatically.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code reported when a connection drops without a close frame
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Default heartbeat interval
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Default heartbeat frame
pub const DEFAULT_HEARTBEAT_PAYLOAD: &str = r#"{"type":"ping"}"#;

/// Default wait before an exhausted retry counter is reset
pub const DEFAULT_RETRY_COOLDOWN: Duration = Duration::from_secs(30);

/// Configuration for ConnectionManager
///
/// Built by [`ConnectionManagerBuilder`](crate::builder::ConnectionManagerBuilder).
pub struct ManagerConfig {
    /// WebSocket base URL (ws:// or wss://), without trailing slash
    pub(crate) base_url: String,

    /// Interval between heartbeat frames while a socket is open
    pub(crate) heartbeat_interval: Duration,

    /// Heartbeat frame
    pub(crate) heartbeat_payload: String,

    /// Backoff policy for non-normal closes
    pub(crate) reconnect_strategy: Arc<dyn ReconnectionStrategy>,

    /// How long an endpoint stays parked after exhausting its retries
    pub(crate) retry_cooldown: Duration,
}

impl ManagerConfig {
    /// Get a reference to the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    pub fn heartbeat_payload(&self) -> &str {
        &self.heartbeat_payload
    }

    pub fn retry_cooldown(&self) -> Duration {
        self.retry_cooldown
    }

    /// Connection URL for `endpoint` authenticated with `token`
    pub fn endpoint_url(&self, endpoint: &str, token: &str) -> String {
        endpoint_url(&self.base_url, endpoint, token)
    }
}

/// Build `{base}/ws/{endpoint}/{token}`
pub fn endpoint_url(base: &str, endpoint: &str, token: &str) -> String {
    format!("{}/ws/{}/{}", base.trim_end_matches('/'), endpoint, token)
}

/// Derive a WebSocket base URL from an HTTP API base URL
///
/// `https://` becomes `wss://` and `http://` becomes `ws://`. URLs that
/// already use a WebSocket scheme are returned unchanged.
pub fn ws_base_from_http(http_base: &str) -> String {
    let base = http_base.trim().trim_end_matches('/');

    if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    }
}
