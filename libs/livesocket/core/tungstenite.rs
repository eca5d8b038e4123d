//! tokio-tungstenite transport
//!
//! Every socket gets one I/O task that owns the stream. The handle returned
//! to the manager only shares the ready state and an outbound queue with it:
//!
//! ```text
//! Socket handle ──send_text/close──> Outbound Channel ──> I/O Task ──> WebSocket
//!                                                            │
//! Manager driver <──── Open / Message / Error / Close ───────┘
//! ```
//!
//! A connection that ends without a close frame (handshake failure, reset,
//! stream end) is reported as close code 1006 after an `Error` event, the
//! same way browsers do.

use crate::config::{ABNORMAL_CLOSURE, NORMAL_CLOSURE};
use crate::ready_state::AtomicReadyState;
use crate::traits::*;
use futures::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as TungsteniteCloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// How long to wait for the server to acknowledge a close we initiated
const CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Frames queued by the socket handle for the I/O task
#[derive(Debug)]
enum Outbound {
    Frame(Message),
    Close(u16, String),
}

/// Default [`Connector`] backed by tokio-tungstenite
#[derive(Debug, Clone, Default)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for TungsteniteConnector {
    fn open(&self, url: &str, events: UnboundedSender<SocketEvent>) -> Arc<dyn Socket> {
        let state = Arc::new(AtomicReadyState::new(ReadyState::Connecting));
        let (outbound_tx, outbound_rx) = unbounded_channel();

        tokio::spawn(run_socket(
            url.to_string(),
            Arc::clone(&state),
            outbound_rx,
            events,
        ));

        Arc::new(TungsteniteSocket {
            state,
            outbound: outbound_tx,
        })
    }
}

struct TungsteniteSocket {
    state: Arc<AtomicReadyState>,
    outbound: UnboundedSender<Outbound>,
}

impl Socket for TungsteniteSocket {
    fn ready_state(&self) -> ReadyState {
        self.state.get()
    }

    fn send_text(&self, text: String) -> Result<()> {
        if !self.state.is_open() {
            return Err(LiveSocketError::NotOpen(format!("{:?}", self.state.get())));
        }

        self.outbound
            .send(Outbound::Frame(Message::Text(text)))
            .map_err(|e| LiveSocketError::ChannelSend(e.to_string()))
    }

    fn close(&self, code: u16, reason: &str) {
        if matches!(self.state.get(), ReadyState::Closing | ReadyState::Closed) {
            return;
        }

        self.state.set(ReadyState::Closing);
        let _ = self.outbound.send(Outbound::Close(code, reason.to_string()));
    }
}

/// Socket I/O task
async fn run_socket(
    url: String,
    state: Arc<AtomicReadyState>,
    mut outbound_rx: UnboundedReceiver<Outbound>,
    events: UnboundedSender<SocketEvent>,
) {
    let connection = tokio::select! {
        result = connect_async(url.as_str()) => result,
        (code, reason) = wait_for_close(&mut outbound_rx) => {
            debug!("Socket closed before the handshake completed");
            state.set(ReadyState::Closed);
            let _ = events.send(SocketEvent::Close(CloseFrame::new(code, reason)));
            return;
        }
    };

    let ws_stream = match connection {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            warn!("Failed to connect: {}", e);
            state.set(ReadyState::Closed);
            let _ = events.send(SocketEvent::Error(e.to_string()));
            let _ = events.send(SocketEvent::Close(CloseFrame::new(
                ABNORMAL_CLOSURE,
                "handshake failed",
            )));
            return;
        }
    };

    // A close requested while the handshake was in flight wins over the upgrade
    if !state.transition(ReadyState::Connecting, ReadyState::Open) {
        let mut ws_stream = ws_stream;
        let (code, reason) = wait_for_close(&mut outbound_rx).await;
        let _ = ws_stream.close(Some(close_frame(code, &reason))).await;
        state.set(ReadyState::Closed);
        let _ = events.send(SocketEvent::Close(CloseFrame::new(code, reason)));
        return;
    }

    info!("WebSocket connected");
    let _ = events.send(SocketEvent::Open);

    let (mut write, mut read) = ws_stream.split();

    // Close we initiated (code, reason) and the server's close frame, if any
    let mut initiated: Option<(u16, String)> = None;
    let mut received: Option<CloseFrame> = None;
    let mut close_deadline: Option<Instant> = None;

    loop {
        let deadline_at = close_deadline;
        let deadline = async move {
            match deadline_at {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(SocketEvent::Message(WsMessage::Text(text)));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        let _ = events.send(SocketEvent::Message(WsMessage::Binary(data)));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        state.set(ReadyState::Closing);
                        received = Some(match frame {
                            Some(f) => CloseFrame::new(u16::from(f.code), f.reason.into_owned()),
                            None => CloseFrame::new(1005, ""),
                        });
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        if initiated.is_none() && received.is_none() {
                            warn!("WebSocket error: {}", e);
                            let _ = events.send(SocketEvent::Error(e.to_string()));
                        }
                        break;
                    }
                    None => break,
                }
            }

            cmd = outbound_rx.recv(), if initiated.is_none() => {
                match cmd {
                    Some(Outbound::Frame(msg)) => {
                        if let Err(e) = write.send(msg).await {
                            warn!("Failed to send frame: {}", e);
                            let _ = events.send(SocketEvent::Error(e.to_string()));
                            break;
                        }
                    }
                    Some(Outbound::Close(code, reason)) => {
                        debug!("Closing socket with code {}", code);
                        let _ = write.send(Message::Close(Some(close_frame(code, &reason)))).await;
                        initiated = Some((code, reason));
                        close_deadline = Some(Instant::now() + CLOSE_HANDSHAKE_TIMEOUT);
                    }
                    None => {
                        // Handle dropped without an explicit close
                        state.set(ReadyState::Closing);
                        let _ = write
                            .send(Message::Close(Some(close_frame(NORMAL_CLOSURE, "released"))))
                            .await;
                        initiated = Some((NORMAL_CLOSURE, "released".to_string()));
                        close_deadline = Some(Instant::now() + CLOSE_HANDSHAKE_TIMEOUT);
                    }
                }
            }

            _ = deadline => {
                debug!("Close handshake timed out");
                break;
            }
        }
    }

    state.set(ReadyState::Closed);

    let frame = match (initiated, received) {
        (Some((code, reason)), _) => CloseFrame::new(code, reason),
        (None, Some(frame)) => frame,
        (None, None) => CloseFrame::new(ABNORMAL_CLOSURE, "connection lost"),
    };

    info!("WebSocket closed with code {}", frame.code);
    let _ = events.send(SocketEvent::Close(frame));
}

/// Wait until the handle asks for a close (or is dropped)
async fn wait_for_close(outbound_rx: &mut UnboundedReceiver<Outbound>) -> (u16, String) {
    loop {
        match outbound_rx.recv().await {
            Some(Outbound::Close(code, reason)) => return (code, reason),
            Some(Outbound::Frame(_)) => continue,
            None => return (NORMAL_CLOSURE, "released".to_string()),
        }
    }
}

fn close_frame(code: u16, reason: &str) -> TungsteniteCloseFrame<'static> {
    TungsteniteCloseFrame {
        code: CloseCode::from(code),
        reason: Cow::Owned(reason.to_string()),
    }
}
