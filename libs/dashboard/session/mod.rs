//! # Session Binder
//!
//! Connects the dashboard's realtime endpoints for the signed-in admin and
//! turns pushed frames into dashboard state changes.
//!
//! ```text
//! token store --> SessionBinder --connect/on--> ConnectionManager
//!                      |
//!                      +--> DepositStore (new deposit requests)
//!                      +--> DashboardSink (refresh requests, alerts)
//! ```

mod binder;
pub mod handlers;
mod token_watch;

pub use binder::SessionBinder;
pub use handlers::{on_new_deposit_request, on_notifications_message, NotificationOutcome};
pub use token_watch::spawn_token_watch;
