//! # LiveSocket
//!
//! Per-endpoint WebSocket connection manager for pushing live admin events
//! (deposits, notifications) to a dashboard.
//!
//! ## Features
//!
//! - **One socket per endpoint**: repeated `connect` calls never open a second socket
//! - **Token-derived URLs**: `{base}/ws/{endpoint}/{token}`, token read fresh on every attempt
//! - **Bounded linear backoff**: five attempts, then a cooldown before retries resume
//! - **Heartbeat**: `{"type":"ping"}` every 30 seconds while the socket is open
//! - **Pub/sub surface**: listeners keyed by event name, decoupled from socket mechanics
//! - **Pluggable transport**: tokio-tungstenite by default, any `Connector` in tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use livesocket::{ConnectionManager, FileTokenStore, listener};
//!
//! let manager = ConnectionManager::builder()
//!     .base_url("wss://api.example.com")
//!     .token_store(FileTokenStore::new("storage.json"))
//!     .build();
//!
//! manager.on("new_deposit_request", listener(|payload| {
//!     println!("deposit: {}", payload);
//! }));
//!
//! manager.connect("admin/deposits");
//! ```

pub mod traits;
pub mod core;
pub mod manager;

// Re-export all traits
pub use traits::*;

// Re-export core functionality
pub use self::core::{
    builder, config, event_bus, heartbeat, ready_state, tungstenite,
    builder::{states, ConnectionManagerBuilder},
    config::{
        endpoint_url, ws_base_from_http, ManagerConfig, ABNORMAL_CLOSURE,
        DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_HEARTBEAT_PAYLOAD, DEFAULT_RETRY_COOLDOWN,
        NORMAL_CLOSURE,
    },
    event_bus::{listener, EventBus, Listener},
    ready_state::AtomicReadyState,
    tungstenite::TungsteniteConnector,
};

// Re-export manager
pub use manager::{ConnectionManager, Endpoint};

/// Type alias for Result with LiveSocketError
pub type Result<T> = std::result::Result<T, traits::LiveSocketError>;
