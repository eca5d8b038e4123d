use crate::config::SessionConfig;
use crate::domain::NEW_DEPOSIT_REQUEST;
use crate::session::handlers::{on_new_deposit_request, on_notifications_message};
use crate::state::{DashboardSink, DepositStore};
use livesocket::{listener, ConnectionManager, Listener, NORMAL_CLOSURE};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How often [`SessionBinder::run`] checks the shutdown flag
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

#[derive(Default)]
struct BinderState {
    /// Token seen by the previous activation
    last_token: Option<String>,
    activation_timer: Option<JoinHandle<()>>,
    reconnect_timers: HashMap<String, JoinHandle<()>>,
    registrations: Vec<(String, Listener)>,
}

struct Inner {
    manager: ConnectionManager,
    config: SessionConfig,
    deposits: DepositStore,
    sink: DashboardSink,
    authenticated: Arc<AtomicBool>,
    state: Mutex<BinderState>,
}

/// Wires connection manager events to dashboard state for one session
///
/// `activate` connects the deposits and notifications endpoints and
/// registers the domain listeners; `deactivate` removes them again. Sockets
/// outlive a deactivation unless the auth token is gone.
pub struct SessionBinder {
    inner: Arc<Inner>,
}

impl SessionBinder {
    pub fn new(
        manager: ConnectionManager,
        config: SessionConfig,
        deposits: DepositStore,
        sink: DashboardSink,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                manager,
                config,
                deposits,
                sink,
                authenticated: Arc::new(AtomicBool::new(false)),
                state: Mutex::new(BinderState::default()),
            }),
        }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.inner.manager
    }

    pub fn deposits(&self) -> &DepositStore {
        &self.inner.deposits
    }

    /// Whether the in-memory session has caught up with the stored token
    pub fn is_authenticated(&self) -> bool {
        self.inner.authenticated.load(Ordering::Acquire)
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.inner.authenticated.store(authenticated, Ordering::Release);
    }

    /// Shared authentication flag for the login flow
    pub fn auth_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.inner.authenticated)
    }

    /// Number of listeners currently registered by this binder
    pub fn registered_listeners(&self) -> usize {
        self.inner.state.lock().registrations.len()
    }

    /// Bring the session's sockets and listeners up
    pub fn activate(&self) {
        let inner = &self.inner;
        let token = inner.manager.token();

        let Some(token) = token else {
            info!("No auth token, realtime endpoints disconnected");
            inner.state.lock().last_token = None;
            inner.disconnect_endpoints();
            return;
        };

        let (rotated, previous_timer) = {
            let mut state = inner.state.lock();
            let rotated = state.last_token.as_ref().is_some_and(|last| *last != token);
            state.last_token = Some(token);
            (rotated, state.activation_timer.take())
        };

        if let Some(timer) = previous_timer {
            timer.abort();
        }

        if rotated {
            info!("Auth token rotated, dropping sockets opened with the old token");
            inner.disconnect_endpoints();
        }

        let delay = if rotated {
            inner.config.rotation_delay()
        } else if !self.is_authenticated() {
            inner.config.hydration_delay()
        } else {
            inner.config.base_delay()
        };

        debug!(delay_ms = delay.as_millis() as u64, "Scheduling realtime connect");
        let timer = tokio::spawn(connect_after(Arc::downgrade(inner), delay));
        inner.state.lock().activation_timer = Some(timer);

        self.register_listeners();
    }

    /// Tear the session's listeners and timers down
    pub fn deactivate(&self) {
        let inner = &self.inner;
        let (registrations, activation_timer, reconnect_timers) = {
            let mut state = inner.state.lock();
            (
                std::mem::take(&mut state.registrations),
                state.activation_timer.take(),
                std::mem::take(&mut state.reconnect_timers),
            )
        };

        for (event, listener) in &registrations {
            inner.manager.off(event, Some(listener));
        }

        if let Some(timer) = activation_timer {
            timer.abort();
        }
        for timer in reconnect_timers.into_values() {
            timer.abort();
        }

        if inner.manager.token().is_none() {
            info!("Auth token gone, disconnecting realtime endpoints");
            inner.disconnect_endpoints();
        }
    }

    /// Follow token changes until `running` turns false
    ///
    /// Activates once, then re-activates on every change published by
    /// `token_rx`, and deactivates on exit.
    pub async fn run(&self, mut token_rx: watch::Receiver<Option<String>>, running: Arc<AtomicBool>) {
        self.activate();
        let present = token_rx.borrow_and_update().is_some();
        self.set_authenticated(present);

        let mut ticker = tokio::time::interval(SHUTDOWN_POLL);

        loop {
            tokio::select! {
                changed = token_rx.changed() => {
                    if changed.is_err() {
                        warn!("Token watch ended");
                        break;
                    }
                    let present = token_rx.borrow_and_update().is_some();
                    self.set_authenticated(present);
                    self.deactivate();
                    self.activate();
                }
                _ = ticker.tick() => {
                    if !running.load(Ordering::Acquire) {
                        break;
                    }
                }
            }
        }

        self.deactivate();
    }

    fn register_listeners(&self) {
        let inner = &self.inner;
        let weak = Arc::downgrade(inner);
        let mut registrations: Vec<(String, Listener)> = Vec::new();

        for endpoint in inner.config.endpoints() {
            let name = endpoint.to_string();
            registrations.push((
                format!("connected:{}", endpoint),
                listener(move |_| info!(endpoint = %name, "Realtime endpoint connected")),
            ));

            let name = endpoint.to_string();
            registrations.push((
                format!("error:{}", endpoint),
                listener(move |payload| {
                    warn!(endpoint = %name, error = %payload["error"], "Realtime endpoint error")
                }),
            ));

            let name = endpoint.to_string();
            let weak = weak.clone();
            registrations.push((
                format!("disconnected:{}", endpoint),
                listener(move |payload| {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_disconnected(&name, payload);
                    }
                }),
            ));
        }

        let deposit_weak = weak.clone();
        registrations.push((
            NEW_DEPOSIT_REQUEST.to_string(),
            listener(move |frame| {
                if let Some(inner) = deposit_weak.upgrade() {
                    on_new_deposit_request(&inner.deposits, &inner.sink, frame);
                }
            }),
        ));

        registrations.push((
            format!("message:{}", inner.config.notifications_endpoint),
            listener(move |frame| {
                if let Some(inner) = weak.upgrade() {
                    on_notifications_message(&inner.sink, frame);
                }
            }),
        ));

        for (event, listener) in &registrations {
            inner.manager.on(event, Arc::clone(listener));
        }

        let previous = std::mem::replace(&mut inner.state.lock().registrations, registrations);
        for (event, listener) in &previous {
            inner.manager.off(event, Some(listener));
        }
    }
}

impl Inner {
    fn disconnect_endpoints(&self) {
        for endpoint in self.config.endpoints() {
            self.manager.disconnect(endpoint);
        }
    }

    fn on_disconnected(self: &Arc<Self>, endpoint: &str, payload: &Value) {
        let code = payload["code"].as_u64().unwrap_or(0);
        info!(endpoint = %endpoint, code = code, "Realtime endpoint disconnected");

        if code == u64::from(NORMAL_CLOSURE) {
            return;
        }

        let delay = self.config.reconnect_delay();
        let timer = tokio::spawn(reconnect_after(
            Arc::downgrade(self),
            endpoint.to_string(),
            delay,
        ));

        if let Some(previous) = self.state.lock().reconnect_timers.insert(endpoint.to_string(), timer) {
            previous.abort();
        }
    }
}

async fn connect_after(weak: Weak<Inner>, delay: Duration) {
    tokio::time::sleep(delay).await;

    let Some(inner) = weak.upgrade() else {
        return;
    };

    if inner.manager.token().is_none() {
        info!("Auth token gone before connect, skipping");
        return;
    }

    for endpoint in inner.config.endpoints() {
        inner.manager.connect(endpoint);
    }
}

async fn reconnect_after(weak: Weak<Inner>, endpoint: String, delay: Duration) {
    tokio::time::sleep(delay).await;

    let Some(inner) = weak.upgrade() else {
        return;
    };

    if inner.manager.token().is_none() {
        debug!(endpoint = %endpoint, "Auth token gone, not reconnecting");
        return;
    }

    info!(endpoint = %endpoint, "Reconnecting realtime endpoint");
    inner.manager.connect(&endpoint);
}
