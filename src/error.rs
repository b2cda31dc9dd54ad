//! Error types for the voice session

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Authentication error: no access token available, login required")]
    Auth,

    #[error("Server responded with {code}: {message}")]
    Server { code: i32, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Session disconnected")]
    Disconnected,

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
