//! Common test utilities for LiveSocket integration tests
//!
//! - [`MockConnector`]: in-process transport whose sockets are driven by the test
//! - [`MockWsServer`]: a real tokio-tungstenite server for end-to-end tests

#![allow(dead_code)]

use livesocket::{
    listener, AtomicReadyState, CloseFrame, ConnectionManager, Connector, LiveSocketError,
    MemoryTokenStore, ReadyState, Socket, SocketEvent, WsMessage,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{broadcast, Notify};

/// Let spawned driver and timer tasks run
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

// =============================================================================
// Mock transport
// =============================================================================

/// Socket whose lifecycle is driven by the test
pub struct MockSocket {
    pub url: String,
    state: AtomicReadyState,
    sent: Mutex<Vec<String>>,
    closed_with: Mutex<Option<(u16, String)>>,
    events: UnboundedSender<SocketEvent>,
}

impl MockSocket {
    /// Server accepted the connection
    pub fn accept(&self) {
        self.state.set(ReadyState::Open);
        let _ = self.events.send(SocketEvent::Open);
    }

    /// Server pushed a text frame
    pub fn push(&self, text: &str) {
        let _ = self
            .events
            .send(SocketEvent::Message(WsMessage::Text(text.to_string())));
    }

    /// Transport error
    pub fn fail(&self, error: &str) {
        let _ = self.events.send(SocketEvent::Error(error.to_string()));
    }

    /// Connection closed by the server or the network
    pub fn drop_with(&self, code: u16) {
        self.state.set(ReadyState::Closed);
        let _ = self
            .events
            .send(SocketEvent::Close(CloseFrame::new(code, "server closed")));
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn closed_with(&self) -> Option<(u16, String)> {
        self.closed_with.lock().clone()
    }
}

impl Socket for MockSocket {
    fn ready_state(&self) -> ReadyState {
        self.state.get()
    }

    fn send_text(&self, text: String) -> livesocket::Result<()> {
        if !self.state.is_open() {
            return Err(LiveSocketError::NotOpen(format!("{:?}", self.state.get())));
        }
        self.sent.lock().push(text);
        Ok(())
    }

    fn close(&self, code: u16, reason: &str) {
        if self.state.get() == ReadyState::Closed {
            return;
        }
        self.state.set(ReadyState::Closed);
        *self.closed_with.lock() = Some((code, reason.to_string()));
        let _ = self
            .events
            .send(SocketEvent::Close(CloseFrame::new(code, reason)));
    }
}

/// Connector recording every socket it opens
#[derive(Clone, Default)]
pub struct MockConnector {
    sockets: Arc<Mutex<Vec<Arc<MockSocket>>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn socket_count(&self) -> usize {
        self.sockets.lock().len()
    }

    pub fn socket(&self, index: usize) -> Arc<MockSocket> {
        Arc::clone(&self.sockets.lock()[index])
    }

    pub fn last(&self) -> Arc<MockSocket> {
        let sockets = self.sockets.lock();
        Arc::clone(sockets.last().expect("no socket opened"))
    }

    /// Sockets opened for URLs containing `needle`
    pub fn opened_for(&self, needle: &str) -> Vec<Arc<MockSocket>> {
        self.sockets
            .lock()
            .iter()
            .filter(|s| s.url.contains(needle))
            .cloned()
            .collect()
    }
}

impl Connector for MockConnector {
    fn open(&self, url: &str, events: UnboundedSender<SocketEvent>) -> Arc<dyn Socket> {
        let socket = Arc::new(MockSocket {
            url: url.to_string(),
            state: AtomicReadyState::new(ReadyState::Connecting),
            sent: Mutex::new(Vec::new()),
            closed_with: Mutex::new(None),
            events,
        });
        self.sockets.lock().push(Arc::clone(&socket));
        socket
    }
}

// =============================================================================
// Mock WebSocket server
// =============================================================================

/// Frames the test asks the server to push to every client
#[derive(Debug, Clone)]
pub enum ServerCommand {
    Text(String),
    Close(u16),
}

/// A mock WebSocket server recording what clients send
pub struct MockWsServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    commands: broadcast::Sender<ServerCommand>,
    pub paths: Arc<Mutex<Vec<String>>>,
    pub received: Arc<Mutex<Vec<String>>>,
    pub close_codes: Arc<Mutex<Vec<u16>>>,
}

impl MockWsServer {
    /// Create and start a new mock WebSocket server
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let (commands, _) = broadcast::channel(64);
        let paths = Arc::new(Mutex::new(Vec::new()));
        let received = Arc::new(Mutex::new(Vec::new()));
        let close_codes = Arc::new(Mutex::new(Vec::new()));

        let server = Self {
            addr,
            shutdown: Arc::clone(&shutdown),
            commands: commands.clone(),
            paths: Arc::clone(&paths),
            received: Arc::clone(&received),
            close_codes: Arc::clone(&close_codes),
        };

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let shutdown = Arc::clone(&shutdown);
                                let commands = commands.subscribe();
                                let paths = Arc::clone(&paths);
                                let received = Arc::clone(&received);
                                let close_codes = Arc::clone(&close_codes);
                                tokio::spawn(async move {
                                    Self::handle_connection(
                                        stream, shutdown, commands, paths, received, close_codes,
                                    )
                                    .await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown.notified() => {
                        break;
                    }
                }
            }
        });

        server
    }

    async fn handle_connection(
        stream: tokio::net::TcpStream,
        shutdown: Arc<Notify>,
        mut commands: broadcast::Receiver<ServerCommand>,
        paths: Arc<Mutex<Vec<String>>>,
        received: Arc<Mutex<Vec<String>>>,
        close_codes: Arc<Mutex<Vec<u16>>>,
    ) {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_hdr_async;
        use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
        use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
        use tokio_tungstenite::tungstenite::protocol::CloseFrame;
        use tokio_tungstenite::tungstenite::Message;

        let path_log = Arc::clone(&paths);
        let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            path_log.lock().push(request.uri().path().to_string());
            Ok(response)
        };

        let ws_stream = match accept_hdr_async(stream, callback).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            received.lock().push(text);
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let code = frame.map(|f| u16::from(f.code)).unwrap_or(1005);
                            close_codes.lock().push(code);
                            let _ = write.close().await;
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(_)) | None => break,
                    }
                }
                cmd = commands.recv() => {
                    match cmd {
                        Ok(ServerCommand::Text(text)) => {
                            if write.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Ok(ServerCommand::Close(code)) => {
                            let frame = CloseFrame {
                                code: CloseCode::from(code),
                                reason: "server closing".into(),
                            };
                            let _ = write.send(Message::Close(Some(frame))).await;
                            break;
                        }
                        Err(_) => break,
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }

    /// Base URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Push a text frame to every connected client
    pub fn push(&self, text: &str) {
        let _ = self.commands.send(ServerCommand::Text(text.to_string()));
    }

    /// Close every connected client with `code`
    pub fn close_all(&self, code: u16) {
        let _ = self.commands.send(ServerCommand::Close(code));
    }

    pub fn connection_count(&self) -> usize {
        self.paths.lock().len()
    }

    /// Wait until `check` holds, polling every 10ms for up to `timeout`
    pub async fn wait_for(&self, timeout: Duration, check: impl Fn(&Self) -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if check(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        check(self)
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// =============================================================================
// Manager helpers
// =============================================================================

/// Manager on top of a mock transport with base `http://api.test`
pub fn mock_manager(connector: &MockConnector, store: &MemoryTokenStore) -> ConnectionManager {
    ConnectionManager::builder()
        .base_url("http://api.test")
        .token_store(store.clone())
        .connector(connector.clone())
        .build()
        .unwrap()
}

/// Records payloads of the events it listens to
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen(&self, manager: &ConnectionManager, event: &str) {
        let events = Arc::clone(&self.events);
        let name = event.to_string();
        manager.on(
            event,
            listener(move |payload| {
                events.lock().push((name.clone(), payload.clone()));
            }),
        );
    }

    pub fn names(&self) -> Vec<String> {
        self.events.lock().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn payloads(&self, event: &str) -> Vec<Value> {
        self.events
            .lock()
            .iter()
            .filter(|(n, _)| n == event)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn count(&self, event: &str) -> usize {
        self.payloads(event).len()
    }
}
