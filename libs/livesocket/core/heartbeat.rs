//! Heartbeat for open sockets
//!
//! # Architecture
//!
//! One Tokio task per open socket:
//!
//! ```text
//! ┌─────────────────────┐
//! │  Heartbeat Task     │
//! │  (Tokio spawn)      │
//! │                     │
//! │  Every interval:    │
//! │  1. Wait for tick   │
//! │  2. Socket open? ───┼──> send {"type":"ping"}
//! │  3. Socket gone? ───┼──> exit
//! └─────────────────────┘
//! ```
//!
//! The manager keeps the task handle in the endpoint's connection record and
//! aborts it when the socket's close event arrives, so a heartbeat never
//! outlives its socket.

use crate::traits::{ReadyState, Socket};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Periodically send `payload` on `socket` while it stays open
///
/// The first frame goes out one full interval after the task starts.
/// The task exits on its own once the socket reports `Closing` or `Closed`.
pub async fn heartbeat_task(interval: Duration, payload: String, socket: Arc<dyn Socket>) {
    let mut ticker = tokio::time::interval(interval);
    // Skip the first immediate tick - wait for the first interval
    ticker.tick().await;
    // If we miss ticks due to slow processing, skip them rather than bursting
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    debug!("Heartbeat task started with interval: {:?}", interval);

    loop {
        ticker.tick().await;

        match socket.ready_state() {
            ReadyState::Open => {
                if let Err(e) = socket.send_text(payload.clone()) {
                    debug!("Heartbeat send failed: {}", e);
                }
            }
            ReadyState::Connecting => {}
            ReadyState::Closing | ReadyState::Closed => {
                debug!("Socket no longer open, heartbeat exiting");
                break;
            }
        }
    }
}

/// Spawn a heartbeat task
pub fn spawn_heartbeat(
    interval: Duration,
    payload: String,
    socket: Arc<dyn Socket>,
) -> JoinHandle<()> {
    tokio::spawn(heartbeat_task(interval, payload, socket))
}
