//! Common test utilities for dashboard integration tests

#![allow(dead_code)]

use crossbeam_channel::Receiver;
use dashboard::{DashboardCommand, DashboardSink, DepositStore, SessionBinder, SessionConfig};
use livesocket::{
    AtomicReadyState, CloseFrame, ConnectionManager, Connector, LiveSocketError, MemoryTokenStore,
    NeverReconnect, ReadyState, Socket, SocketEvent, WsMessage,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

pub const DEPOSITS: &str = "admin/deposits";
pub const NOTIFICATIONS: &str = "notifications";

/// Let spawned driver and timer tasks run
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Advance paused time by `ms` and let woken tasks run
///
/// Settles first so freshly spawned timers register their deadlines.
pub async fn advance(ms: u64) {
    settle().await;
    tokio::time::advance(Duration::from_millis(ms)).await;
    settle().await;
}

pub struct MockSocket {
    pub url: String,
    state: AtomicReadyState,
    closed_with: Mutex<Option<u16>>,
    events: UnboundedSender<SocketEvent>,
}

impl MockSocket {
    pub fn accept(&self) {
        self.state.set(ReadyState::Open);
        let _ = self.events.send(SocketEvent::Open);
    }

    pub fn push(&self, text: &str) {
        let _ = self
            .events
            .send(SocketEvent::Message(WsMessage::Text(text.to_string())));
    }

    pub fn drop_with(&self, code: u16) {
        self.state.set(ReadyState::Closed);
        let _ = self
            .events
            .send(SocketEvent::Close(CloseFrame::new(code, "server closed")));
    }

    pub fn closed_with(&self) -> Option<u16> {
        *self.closed_with.lock()
    }
}

impl Socket for MockSocket {
    fn ready_state(&self) -> ReadyState {
        self.state.get()
    }

    fn send_text(&self, _text: String) -> livesocket::Result<()> {
        if !self.state.is_open() {
            return Err(LiveSocketError::NotOpen(format!("{:?}", self.state.get())));
        }
        Ok(())
    }

    fn close(&self, code: u16, reason: &str) {
        if self.state.get() == ReadyState::Closed {
            return;
        }
        self.state.set(ReadyState::Closed);
        *self.closed_with.lock() = Some(code);
        let _ = self
            .events
            .send(SocketEvent::Close(CloseFrame::new(code, reason)));
    }
}

#[derive(Clone, Default)]
pub struct MockConnector {
    sockets: Arc<Mutex<Vec<Arc<MockSocket>>>>,
}

impl MockConnector {
    pub fn socket_count(&self) -> usize {
        self.sockets.lock().len()
    }

    /// Sockets opened for `endpoint`, oldest first
    pub fn sockets_for(&self, endpoint: &str) -> Vec<Arc<MockSocket>> {
        let needle = format!("/ws/{}/", endpoint);
        self.sockets
            .lock()
            .iter()
            .filter(|s| s.url.contains(&needle))
            .cloned()
            .collect()
    }

    /// Latest socket opened for `endpoint`
    pub fn latest(&self, endpoint: &str) -> Arc<MockSocket> {
        self.sockets_for(endpoint)
            .pop()
            .expect("no socket opened for endpoint")
    }
}

impl Connector for MockConnector {
    fn open(&self, url: &str, events: UnboundedSender<SocketEvent>) -> Arc<dyn Socket> {
        let socket = Arc::new(MockSocket {
            url: url.to_string(),
            state: AtomicReadyState::new(ReadyState::Connecting),
            closed_with: Mutex::new(None),
            events,
        });
        self.sockets.lock().push(Arc::clone(&socket));
        socket
    }
}

/// Binder wired to a mock transport
pub struct Harness {
    pub connector: MockConnector,
    pub store: MemoryTokenStore,
    pub binder: SessionBinder,
    pub commands: Receiver<DashboardCommand>,
}

impl Harness {
    /// Manager retries are disabled so only the binder reconnects
    pub fn new(token: Option<&str>) -> Self {
        let connector = MockConnector::default();
        let store = MemoryTokenStore::new();
        store.set(token.map(str::to_string));

        let manager = ConnectionManager::builder()
            .base_url("https://api.test")
            .token_store(store.clone())
            .connector(connector.clone())
            .reconnect_strategy(NeverReconnect)
            .build()
            .unwrap();

        let (sink, commands) = DashboardSink::channel();
        let binder = SessionBinder::new(manager, SessionConfig::default(), DepositStore::new(), sink);

        Self {
            connector,
            store,
            binder,
            commands,
        }
    }

    pub fn drain(&self) -> Vec<DashboardCommand> {
        self.commands.try_iter().collect()
    }

    /// Activate as an already hydrated session and open both sockets
    pub async fn connected(token: &str) -> Self {
        let harness = Self::new(Some(token));
        harness.binder.set_authenticated(true);
        harness.binder.activate();
        advance(300).await;
        harness.connector.latest(DEPOSITS).accept();
        harness.connector.latest(NOTIFICATIONS).accept();
        settle().await;
        harness
    }
}
