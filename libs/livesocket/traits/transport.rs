use crate::Result;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// WebSocket payload, text or binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
}

impl WsMessage {
    /// Get the message as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            WsMessage::Text(s) => Some(s),
            WsMessage::Binary(_) => None,
        }
    }

    /// Get the message as binary, if it is binary
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            WsMessage::Text(_) => None,
            WsMessage::Binary(b) => Some(b),
        }
    }
}

/// Socket ready state, numbered like the WebSocket API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    /// `Connecting` or `Open`: the socket still counts as live
    pub fn is_live(self) -> bool {
        matches!(self, ReadyState::Connecting | ReadyState::Open)
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

/// Close code and reason reported when a socket closes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    pub code: u16,
    pub reason: String,
}

impl CloseFrame {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// Lifecycle events a transport reports for one socket
///
/// Events are delivered in the order the transport observes them:
/// `Open`, then any number of `Message`s, then exactly one `Close`.
/// `Error` may precede `Close`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Open,
    Message(WsMessage),
    Close(CloseFrame),
    Error(String),
}

/// Handle to one physical socket
pub trait Socket: Send + Sync {
    /// Current ready state
    fn ready_state(&self) -> ReadyState;

    /// Queue a text frame; fails unless the socket is open
    fn send_text(&self, text: String) -> Result<()>;

    /// Start the closing handshake with the given code
    fn close(&self, code: u16, reason: &str);
}

/// Opens sockets
///
/// `open` must return immediately; the connection attempt proceeds in the
/// background and reports progress through `events`.
pub trait Connector: Send + Sync {
    fn open(&self, url: &str, events: UnboundedSender<SocketEvent>) -> Arc<dyn Socket>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_states() {
        assert!(ReadyState::Connecting.is_live());
        assert!(ReadyState::Open.is_live());
        assert!(!ReadyState::Closing.is_live());
        assert!(!ReadyState::Closed.is_live());
    }

    #[test]
    fn ready_state_round_trips_through_u8() {
        for state in [
            ReadyState::Connecting,
            ReadyState::Open,
            ReadyState::Closing,
            ReadyState::Closed,
        ] {
            assert_eq!(ReadyState::from_u8(state as u8), state);
        }
        assert_eq!(ReadyState::from_u8(42), ReadyState::Closed);
    }
}
