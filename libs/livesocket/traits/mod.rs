//! # LiveSocket Traits
//!
//! Core traits and types shared by the connection manager and its transports:
//!
//! - **TokenStore**: where the auth token used in connection URLs lives
//! - **Connector / Socket**: the transport seam (tokio-tungstenite in production)
//! - **ReconnectionStrategy**: how long to wait between reconnect attempts
//!
//! ## Example
//!
//! ```rust,ignore
//! use livesocket::*;
//!
//! // Token kept in memory, rotated by the login flow
//! let store = MemoryTokenStore::new();
//! store.set(Some("abc".into()));
//! assert_eq!(store.token().as_deref(), Some("abc"));
//! ```

pub mod error;
pub mod reconnect;
pub mod token;
pub mod transport;

// Re-export commonly used types
pub use error::{LiveSocketError, Result};
pub use reconnect::{LinearBackoff, NeverReconnect, ReconnectionStrategy};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use transport::{CloseFrame, Connector, ReadyState, Socket, SocketEvent, WsMessage};
