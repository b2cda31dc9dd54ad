use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::error::{Result, SessionError};

/// Result code the server uses for a successful reply
pub const RESULT_OK: i32 = 200;

/// Audio format assumed when the server omits `audio_format`
pub const DEFAULT_AUDIO_FORMAT: &str = "mp3";

/// Request envelope sent to the voice server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    pub message: String,
    pub server_action: Option<String>,
    pub data: Option<Value>,
}

impl OutboundEnvelope {
    /// Build an envelope; an empty string payload is sent as `null`
    pub fn new(
        message: impl Into<String>,
        server_action: Option<String>,
        data: Option<Value>,
    ) -> Self {
        let data = match data {
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::Null) => None,
            other => other,
        };

        Self {
            message: message.into(),
            server_action,
            data,
        }
    }

    /// Encode as a JSON text frame
    pub fn to_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Reply (or server-pushed greeting) received from the voice server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    pub result_code: i32,
    #[serde(default)]
    pub result_message: Option<String>,
    #[serde(default)]
    pub text_message: Option<String>,
    #[serde(default)]
    pub audio_base64: Option<String>,
    #[serde(default)]
    pub audio_format: Option<String>,
    #[serde(default)]
    pub client_action: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl InboundEnvelope {
    /// Decode a JSON text frame
    pub fn decode(frame: &str) -> Result<Self> {
        serde_json::from_str(frame)
            .map_err(|e| SessionError::Decode(format!("invalid inbound frame: {}", e)))
    }

    pub fn is_success(&self) -> bool {
        self.result_code == RESULT_OK
    }

    /// Audio container format, `mp3` unless the server says otherwise
    pub fn audio_format(&self) -> &str {
        self.audio_format
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_AUDIO_FORMAT)
    }

    /// Decoded audio bytes, or `None` when the frame carries no audio
    pub fn decode_audio(&self) -> Result<Option<Vec<u8>>> {
        match self.audio_base64.as_deref() {
            None | Some("") => Ok(None),
            Some(encoded) => base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map(Some)
                .map_err(|e| SessionError::Decode(format!("invalid audio payload: {}", e))),
        }
    }

    /// Error to surface for a non-200 reply
    pub fn server_error(&self) -> SessionError {
        SessionError::Server {
            code: self.result_code,
            message: self
                .result_message
                .clone()
                .unwrap_or_else(|| "unknown server error".to_string()),
        }
    }
}

/// Normalized result handed back to callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Decoded text reply
    pub text: Option<String>,

    /// Local artifact holding the audio reply, if any
    pub file_path: Option<PathBuf>,

    /// Routing tag for the navigation layer
    pub action: Option<String>,

    /// Structured payload accompanying the action
    pub data: Option<Value>,
}

impl SessionResult {
    pub fn from_envelope(envelope: InboundEnvelope, file_path: Option<PathBuf>) -> Self {
        Self {
            text: envelope.text_message,
            file_path,
            action: envelope.client_action,
            data: envelope.data,
        }
    }
}
