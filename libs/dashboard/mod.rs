//! # Dashboard
//!
//! Real-time side of the admin dashboard: configuration, the session binder
//! that keeps the deposits and notifications sockets connected for the
//! signed-in admin, and the state those sockets feed.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dashboard::{DashboardConfig, DashboardSink, DepositStore, SessionBinder};
//! use livesocket::{ConnectionManager, FileTokenStore};
//!
//! let config = DashboardConfig::load("config/dashboard.yaml")?;
//! let store = FileTokenStore::new(&config.token_file);
//! let manager = ConnectionManager::builder()
//!     .base_url(config.ws_base())
//!     .token_store(store)
//!     .build()?;
//!
//! let (sink, commands) = DashboardSink::channel();
//! let binder = SessionBinder::new(manager, config.session.clone(), DepositStore::new(), sink);
//! binder.activate();
//! ```

pub mod config;
pub mod domain;
pub mod session;
pub mod state;
pub mod utils;

pub use config::{ConfigError, ConnectionConfig, DashboardConfig, SessionConfig};
pub use domain::{DepositRecord, DepositStatus};
pub use session::{spawn_token_watch, NotificationOutcome, SessionBinder};
pub use state::{Alert, AlertKind, DashboardCommand, DashboardSink, DepositStore, RefreshTarget};
pub use utils::{init_tracing, ShutdownManager};
