use crate::config::{ManagerConfig, NORMAL_CLOSURE};
use crate::event_bus::{EventBus, Listener};
use crate::heartbeat::spawn_heartbeat;
use crate::traits::*;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Logical channel name, e.g. `"admin/deposits"`
pub type Endpoint = String;

/// A socket the manager currently tracks for an endpoint
struct TrackedSocket {
    /// Distinguishes this socket from earlier ones on the same endpoint
    id: u64,
    handle: Arc<dyn Socket>,
    heartbeat: Option<JoinHandle<()>>,
}

impl TrackedSocket {
    fn stop_heartbeat(&mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.abort();
        }
    }
}

/// Connection record for one endpoint
#[derive(Default)]
struct EndpointRecord {
    socket: Option<TrackedSocket>,
    /// Reconnect attempts since the last successful open
    attempts: u32,
    reconnect_timer: Option<JoinHandle<()>>,
    cooldown_timer: Option<JoinHandle<()>>,
}

impl EndpointRecord {
    fn cancel_timers(&mut self) {
        if let Some(timer) = self.reconnect_timer.take() {
            timer.abort();
        }
        if let Some(timer) = self.cooldown_timer.take() {
            timer.abort();
        }
    }
}

struct Inner {
    config: ManagerConfig,
    token_store: Arc<dyn TokenStore>,
    connector: Arc<dyn Connector>,
    bus: EventBus,
    endpoints: Mutex<HashMap<Endpoint, EndpointRecord>>,
    next_socket_id: AtomicU64,
}

/// Manager for per-endpoint WebSocket connections
///
/// Keeps zero or one live socket per endpoint, reconnects after abnormal
/// closes with bounded linear backoff, sends a heartbeat while a socket is
/// open and republishes inbound frames as named events:
///
/// | Event | When | Payload |
/// |-------|------|---------|
/// | `connected:{endpoint}` | socket opened | `{"endpoint"}` |
/// | `disconnected:{endpoint}` | socket closed | `{"endpoint", "code", "reason"}` |
/// | `error:{endpoint}` | transport error | `{"endpoint", "error"}` |
/// | `{type}` | frame with a `type` field | the frame |
/// | `message:{endpoint}` | every JSON frame | the frame |
/// | `notification` | untyped frame with `id` or `notification` | the frame |
///
/// The manager is a cheap handle: clones share the same sockets and
/// listeners. Create one per process and pass it to whoever needs it.
/// All operations must run inside a Tokio runtime.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Create a builder
    pub fn builder() -> crate::builder::ConnectionManagerBuilder<
        crate::builder::states::NoUrl,
        crate::builder::states::NoTokenStore,
    > {
        crate::builder::ConnectionManagerBuilder::new()
    }

    pub(crate) fn new(
        config: ManagerConfig,
        token_store: Arc<dyn TokenStore>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                token_store,
                connector,
                bus: EventBus::new(),
                endpoints: Mutex::new(HashMap::new()),
                next_socket_id: AtomicU64::new(1),
            }),
        }
    }

    fn from_weak(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// Current token from the token store
    pub fn token(&self) -> Option<String> {
        self.inner.token_store.token()
    }

    /// Open a socket for `endpoint` unless one is already connecting or open
    ///
    /// Returns `true` once the attempt is issued (not once the socket is
    /// open) or when a live socket already exists, `false` when no token
    /// is available. A closing or closed socket left over for the endpoint
    /// is discarded.
    pub fn connect(&self, endpoint: &str) -> bool {
        let mut endpoints = self.inner.endpoints.lock();

        if let Some(record) = endpoints.get_mut(endpoint) {
            if let Some(tracked) = record.socket.as_mut() {
                if tracked.handle.ready_state().is_live() {
                    debug!(endpoint = %endpoint, "Socket already connecting or open");
                    return true;
                }
                tracked.stop_heartbeat();
            }
            record.socket = None;
        }

        let token = match self.inner.token_store.token() {
            Some(token) => token,
            None => {
                warn!(endpoint = %endpoint, "No auth token, not connecting");
                return false;
            }
        };

        let url = self.inner.config.endpoint_url(endpoint, &token);
        let (events_tx, events_rx) = unbounded_channel();
        let handle = self.inner.connector.open(&url, events_tx);
        let id = self.inner.next_socket_id.fetch_add(1, Ordering::Relaxed);

        endpoints.entry(endpoint.to_string()).or_default().socket = Some(TrackedSocket {
            id,
            handle,
            heartbeat: None,
        });
        drop(endpoints);

        tokio::spawn(drive_socket(
            Arc::downgrade(&self.inner),
            endpoint.to_string(),
            id,
            events_rx,
        ));

        info!(endpoint = %endpoint, "Connecting");
        true
    }

    /// Close the endpoint's socket with code 1000 and forget it
    ///
    /// Cancels pending reconnect and cooldown timers and resets the retry
    /// counter. No-op for unknown endpoints.
    pub fn disconnect(&self, endpoint: &str) {
        let record = self.inner.endpoints.lock().remove(endpoint);

        let Some(mut record) = record else {
            return;
        };

        record.cancel_timers();

        if let Some(mut tracked) = record.socket.take() {
            tracked.stop_heartbeat();
            tracked.handle.close(NORMAL_CLOSURE, "manual disconnect");
            info!(endpoint = %endpoint, "Disconnected");
        }
    }

    /// Disconnect every tracked endpoint
    pub fn disconnect_all(&self) {
        for endpoint in self.tracked_endpoints() {
            self.disconnect(&endpoint);
        }
    }

    /// Send `payload` if the endpoint's socket is open
    ///
    /// Strings are sent as-is, any other value is serialized to JSON.
    /// Returns `false` when the socket is not open or the frame could not
    /// be serialized or queued.
    pub fn send(&self, payload: &Value, endpoint: &str) -> bool {
        match payload {
            Value::String(text) => self.send_text(text, endpoint),
            other => match serde_json::to_string(other) {
                Ok(text) => self.send_text(&text, endpoint),
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "Failed to serialize payload");
                    false
                }
            },
        }
    }

    /// Send a raw text frame if the endpoint's socket is open
    pub fn send_text(&self, text: &str, endpoint: &str) -> bool {
        let handle = match self.socket_handle(endpoint) {
            Some(handle) if handle.ready_state() == ReadyState::Open => handle,
            _ => {
                debug!(endpoint = %endpoint, "Socket not open, dropping frame");
                return false;
            }
        };

        match handle.send_text(text.to_string()) {
            Ok(()) => true,
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Failed to send frame");
                false
            }
        }
    }

    /// Register `listener` for `event`
    ///
    /// Returns `false` if this exact listener was already registered.
    pub fn on(&self, event: &str, listener: Listener) -> bool {
        self.inner.bus.on(event, listener)
    }

    /// Remove `listener` from `event`, or every listener of `event` when `None`
    pub fn off(&self, event: &str, listener: Option<&Listener>) {
        self.inner.bus.off(event, listener);
    }

    /// Publish `payload` to the listeners of `event`
    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        self.inner.bus.emit(event, payload)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.bus.listener_count(event)
    }

    pub fn is_connected(&self, endpoint: &str) -> bool {
        self.ready_state(endpoint) == ReadyState::Open
    }

    /// Ready state of the endpoint's socket, `Closed` when none is tracked
    pub fn ready_state(&self, endpoint: &str) -> ReadyState {
        self.socket_handle(endpoint)
            .map_or(ReadyState::Closed, |handle| handle.ready_state())
    }

    /// Endpoints with a socket, a pending timer or a retry count
    pub fn tracked_endpoints(&self) -> Vec<Endpoint> {
        self.inner.endpoints.lock().keys().cloned().collect()
    }

    /// Reconnect attempts since the endpoint's last successful open
    pub fn retry_attempts(&self, endpoint: &str) -> u32 {
        self.inner
            .endpoints
            .lock()
            .get(endpoint)
            .map_or(0, |record| record.attempts)
    }

    fn socket_handle(&self, endpoint: &str) -> Option<Arc<dyn Socket>> {
        self.inner
            .endpoints
            .lock()
            .get(endpoint)
            .and_then(|record| record.socket.as_ref())
            .map(|tracked| Arc::clone(&tracked.handle))
    }

    fn handle_open(&self, endpoint: &str, socket_id: u64) {
        {
            let mut endpoints = self.inner.endpoints.lock();
            let Some(record) = endpoints.get_mut(endpoint) else {
                debug!(endpoint = %endpoint, "Untracked socket opened, ignoring");
                return;
            };
            let Some(tracked) = record.socket.as_mut().filter(|t| t.id == socket_id) else {
                debug!(endpoint = %endpoint, "Stale socket opened, ignoring");
                return;
            };

            tracked.stop_heartbeat();
            tracked.heartbeat = Some(spawn_heartbeat(
                self.inner.config.heartbeat_interval,
                self.inner.config.heartbeat_payload.clone(),
                Arc::clone(&tracked.handle),
            ));

            record.attempts = 0;
            if let Some(timer) = record.cooldown_timer.take() {
                timer.abort();
            }
        }

        info!(endpoint = %endpoint, "Connected");
        self.emit(&format!("connected:{}", endpoint), &json!({ "endpoint": endpoint }));
    }

    fn handle_message(&self, endpoint: &str, message: WsMessage) {
        let parsed: serde_json::Result<Value> = match &message {
            WsMessage::Text(text) => serde_json::from_str(text),
            WsMessage::Binary(data) => serde_json::from_slice(data),
        };

        let payload = match parsed {
            Ok(payload) => payload,
            Err(e) => {
                debug!(endpoint = %endpoint, error = %e, "Dropping malformed frame");
                return;
            }
        };

        let event_type = payload.get("type").and_then(Value::as_str);

        if let Some(event_type) = event_type {
            self.emit(event_type, &payload);
        }

        self.emit(&format!("message:{}", endpoint), &payload);

        if event_type.is_none()
            && (payload.get("id").is_some() || payload.get("notification").is_some())
        {
            self.emit("notification", &payload);
        }
    }

    fn handle_close(&self, endpoint: &str, socket_id: u64, frame: CloseFrame) {
        let was_current = {
            let mut endpoints = self.inner.endpoints.lock();
            match endpoints.get_mut(endpoint) {
                Some(record) if record.socket.as_ref().map(|t| t.id) == Some(socket_id) => {
                    if let Some(mut tracked) = record.socket.take() {
                        tracked.stop_heartbeat();
                    }
                    true
                }
                _ => false,
            }
        };

        info!(
            endpoint = %endpoint,
            code = frame.code,
            reason = %frame.reason,
            "Socket closed"
        );
        self.emit(
            &format!("disconnected:{}", endpoint),
            &json!({ "endpoint": endpoint, "code": frame.code, "reason": frame.reason }),
        );

        if was_current && frame.code != NORMAL_CLOSURE {
            self.schedule_reconnect(endpoint);
        }
    }

    fn handle_error(&self, endpoint: &str, error: &str) {
        warn!(endpoint = %endpoint, error = %error, "Socket error");
        self.emit(
            &format!("error:{}", endpoint),
            &json!({ "endpoint": endpoint, "error": error }),
        );
    }

    /// Apply the retry policy after an abnormal close
    fn schedule_reconnect(&self, endpoint: &str) {
        let strategy = &self.inner.config.reconnect_strategy;
        let mut endpoints = self.inner.endpoints.lock();
        let record = endpoints.entry(endpoint.to_string()).or_default();

        if strategy.should_reconnect(record.attempts) {
            record.attempts += 1;
            let attempt = record.attempts;

            let Some(delay) = strategy.next_delay(attempt) else {
                return;
            };

            if let Some(timer) = record.reconnect_timer.take() {
                timer.abort();
            }

            info!(
                endpoint = %endpoint,
                attempt = attempt,
                "Reconnecting in {:?}",
                delay
            );
            record.reconnect_timer = Some(tokio::spawn(reconnect_after(
                Arc::downgrade(&self.inner),
                endpoint.to_string(),
                delay,
            )));
        } else {
            if record.attempts == 0 {
                debug!(endpoint = %endpoint, "Reconnection disabled");
                return;
            }

            let pending = record
                .cooldown_timer
                .as_ref()
                .is_some_and(|timer| !timer.is_finished());
            if pending {
                return;
            }

            let cooldown = self.inner.config.retry_cooldown;
            warn!(
                endpoint = %endpoint,
                attempts = record.attempts,
                "Reconnect attempts exhausted, retrying allowed again in {:?}",
                cooldown
            );
            record.cooldown_timer = Some(tokio::spawn(reset_after_cooldown(
                Arc::downgrade(&self.inner),
                endpoint.to_string(),
                cooldown,
            )));
        }
    }
}

/// Deliver one socket's events to the manager in transport order
async fn drive_socket(
    weak: Weak<Inner>,
    endpoint: Endpoint,
    socket_id: u64,
    mut events: UnboundedReceiver<SocketEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(manager) = ConnectionManager::from_weak(&weak) else {
            break;
        };

        match event {
            SocketEvent::Open => manager.handle_open(&endpoint, socket_id),
            SocketEvent::Message(message) => manager.handle_message(&endpoint, message),
            SocketEvent::Error(error) => manager.handle_error(&endpoint, &error),
            SocketEvent::Close(frame) => {
                manager.handle_close(&endpoint, socket_id, frame);
                break;
            }
        }
    }
}

async fn reconnect_after(weak: Weak<Inner>, endpoint: Endpoint, delay: Duration) {
    tokio::time::sleep(delay).await;

    let Some(manager) = ConnectionManager::from_weak(&weak) else {
        return;
    };

    match manager.inner.endpoints.lock().get_mut(&endpoint) {
        // Detach our own handle; dropping a JoinHandle does not cancel the task
        Some(record) => record.reconnect_timer = None,
        None => {
            debug!(endpoint = %endpoint, "Endpoint disconnected meanwhile, skipping reconnect");
            return;
        }
    }

    if manager.token().is_none() {
        info!(endpoint = %endpoint, "Token gone, skipping reconnect");
        return;
    }

    manager.connect(&endpoint);
}

async fn reset_after_cooldown(weak: Weak<Inner>, endpoint: Endpoint, cooldown: Duration) {
    tokio::time::sleep(cooldown).await;

    let Some(manager) = ConnectionManager::from_weak(&weak) else {
        return;
    };

    if let Some(record) = manager.inner.endpoints.lock().get_mut(&endpoint) {
        record.attempts = 0;
        record.cooldown_timer = None;
        info!(endpoint = %endpoint, "Retry counter reset after cooldown");
    };
}
