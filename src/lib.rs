//! Admin Realtime - Main Library
//!
//! Real-time notification client for the admin dashboard.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (config paths)
//! - **livesocket**: Per-endpoint WebSocket connection manager (re-exported from workspace)
//! - **dashboard**: Session binder, dashboard state and configuration (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use admin_realtime::bin_common::{load_config_from_env, ConfigType};
//! use admin_realtime::dashboard::DashboardConfig;
//!
//! let config = DashboardConfig::load(load_config_from_env(ConfigType::Dashboard))?;
//! ```

// Re-export workspace libraries for convenience
pub use dashboard;
pub use livesocket;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;

    pub use cli::{config_type_from_args, load_config_from_env, parse_args, ConfigType};
}
