//! # LiveSocket Core
//!
//! Building blocks of the connection manager: configuration and its
//! type-state builder, the event bus, the heartbeat task, the atomic ready
//! state and the tokio-tungstenite transport.
//!
//! ## Example
//!
//! ```rust,ignore
//! use livesocket::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = livesocket::builder()
//!         .base_url("https://api.example.com")
//!         .token_store(FileTokenStore::new("storage.json"))
//!         .heartbeat(Duration::from_secs(30), r#"{"type":"ping"}"#)
//!         .reconnect_strategy(LinearBackoff::default())
//!         .build()?;
//!
//!     manager.on("connected:notifications", listener(|_| println!("up")));
//!     manager.connect("notifications");
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod event_bus;
pub mod heartbeat;
pub mod ready_state;
pub mod tungstenite;

// Re-export main types
pub use builder::{states, ConnectionManagerBuilder};
pub use config::ManagerConfig;
pub use event_bus::{listener, EventBus, Listener};
pub use ready_state::AtomicReadyState;
pub use tungstenite::TungsteniteConnector;

/// Create a new connection manager builder
pub fn builder() -> ConnectionManagerBuilder<states::NoUrl, states::NoTokenStore> {
    ConnectionManagerBuilder::new()
}
