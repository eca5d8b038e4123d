use thiserror::Error;

/// Main error type for livesocket
#[derive(Error, Debug)]
pub enum LiveSocketError {
    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Socket is not open for writing
    #[error("Socket not open: {0}")]
    NotOpen(String),

    /// Outbound queue of a socket is gone
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Token storage could not be read
    #[error("Token store error: {0}")]
    TokenStore(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for livesocket operations
pub type Result<T> = std::result::Result<T, LiveSocketError>;
