use livesocket::TokenStore;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Poll `store` and publish every token change
///
/// The receiver starts with the current token. The task exits once every
/// receiver has been dropped.
pub fn spawn_token_watch<S>(
    store: S,
    poll_interval: Duration,
) -> (watch::Receiver<Option<String>>, JoinHandle<()>)
where
    S: TokenStore + 'static,
{
    let (tx, rx) = watch::channel(store.token());

    let handle = tokio::spawn(async move {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if tx.is_closed() {
                debug!("No token watchers left, stopping");
                break;
            }

            let token = store.token();
            let changed = tx.send_if_modified(|current| {
                if *current == token {
                    return false;
                }
                *current = token;
                true
            });

            if changed {
                info!(present = tx.borrow().is_some(), "Auth token changed");
            }
        }
    });

    (rx, handle)
}
