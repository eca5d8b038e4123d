//! Deposit watcher
//!
//! Keeps the admin deposits and notifications sockets connected for the
//! token in the configured token file and logs every dashboard command
//! (refresh requests and alerts) until Ctrl+C.
//!
//! Usage: `deposit_watch [config.yaml]`

use admin_realtime::bin_common::{config_type_from_args, load_config_from_env, parse_args};
use admin_realtime::dashboard::{
    init_tracing, spawn_token_watch, DashboardCommand, DashboardConfig, DashboardSink,
    DepositStore, SessionBinder, ShutdownManager,
};
use admin_realtime::livesocket::{
    ConnectionManager, FileTokenStore, TungsteniteConnector, DEFAULT_HEARTBEAT_PAYLOAD,
};
use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config_path = load_config_from_env(config_type_from_args(&parse_args()));
    let config = DashboardConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    init_tracing(&config.log_level);

    info!("========================================");
    info!("Starting deposit_watch");
    info!("  Config: {}", config_path.display());
    info!("  WebSocket base: {}", config.ws_base());
    info!("  Token file: {}", config.token_file);
    info!("Press Ctrl+C to stop");
    info!("========================================");

    let shutdown = ShutdownManager::new();
    shutdown.spawn_signal_handler();

    let token_store = FileTokenStore::new(&config.token_file);
    let connection = &config.connection;

    let manager = ConnectionManager::builder()
        .base_url(config.ws_base())
        .token_store(token_store.clone())
        .connector(TungsteniteConnector::new())
        .heartbeat(connection.heartbeat_interval(), DEFAULT_HEARTBEAT_PAYLOAD)
        .reconnect_strategy(connection.reconnect_strategy())
        .retry_cooldown(connection.retry_cooldown())
        .build()?;

    let (sink, commands) = DashboardSink::channel();
    let deposits = DepositStore::new();
    let binder = SessionBinder::new(
        manager.clone(),
        config.session.clone(),
        deposits.clone(),
        sink,
    );

    let logger = {
        let running = shutdown.flag();
        std::thread::spawn(move || log_commands(commands, deposits, running))
    };

    let (token_rx, token_watch) =
        spawn_token_watch(token_store, config.session.token_poll_interval());

    binder.run(token_rx, shutdown.flag()).await;

    manager.disconnect_all();
    token_watch.abort();

    // Let close frames go out before the runtime stops
    tokio::time::sleep(Duration::from_millis(250)).await;
    drop(binder);

    if logger.join().is_err() {
        warn!("Command logger panicked");
    }

    info!("deposit_watch stopped gracefully");
    Ok(())
}

/// Drain dashboard commands on a plain thread until shutdown
fn log_commands(commands: Receiver<DashboardCommand>, deposits: DepositStore, running: Arc<AtomicBool>) {
    while running.load(Ordering::Acquire) {
        match commands.recv_timeout(Duration::from_millis(200)) {
            Ok(DashboardCommand::Refresh(target)) => {
                info!(target = ?target, "Refresh requested");
            }
            Ok(DashboardCommand::Alert(alert)) => {
                info!(kind = ?alert.kind, pending = deposits.len(), "ALERT: {}", alert.message);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
