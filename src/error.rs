use crate::chat::playback::PlaybackError;
use crate::chat::voice::CaptureError;
use crate::session_store::SessionStoreError;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, StrideError>;

#[derive(Error, Debug)]
pub enum StrideError {
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No response from server: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server rejected request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Chat channel handshake failed: {0}")]
    ChannelHandshake(String),

    #[error("Chat channel closed")]
    ChannelClosed,

    #[error("No active session")]
    SessionRequired,

    #[error("No active conversation")]
    NoActiveConversation,

    #[error("Session store error: {0}")]
    SessionStore(#[from] SessionStoreError),

    #[error("Audio capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Audio playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for StrideError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        StrideError::Other(anyhow::anyhow!(err.to_string()))
    }
}

impl StrideError {
    /// Message suitable for a user-facing alert. Server-provided messages are
    /// preserved; transport failures collapse to a generic connectivity string.
    pub fn user_message(&self) -> String {
        match self {
            StrideError::Api { message, .. } => message.clone(),
            StrideError::Network(_) => {
                "No response from server. Please check your internet connection.".to_string()
            }
            StrideError::Capture(CaptureError::PermissionDenied) => {
                "Please grant microphone access to record voice messages".to_string()
            }
            other => other.to_string(),
        }
    }
}
