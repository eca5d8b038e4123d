//! # LiveSocket Manager
//!
//! Registry of per-endpoint sockets with reconnection, heartbeat and a
//! publish/subscribe event surface.

pub mod manager;

pub use manager::{ConnectionManager, Endpoint};
