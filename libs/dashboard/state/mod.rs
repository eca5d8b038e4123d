//! Dashboard application state touched by real-time events

mod commands;
mod store;

pub use commands::{Alert, AlertKind, DashboardCommand, DashboardSink, RefreshTarget};
pub use store::DepositStore;
