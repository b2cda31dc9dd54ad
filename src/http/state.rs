use crate::facade::VoiceChat;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The process's voice chat service
    pub chat: Arc<VoiceChat>,
}

impl AppState {
    pub fn new(chat: Arc<VoiceChat>) -> Self {
        Self { chat }
    }
}
