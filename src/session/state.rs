use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of the single logical connection
///
/// `Idle → Connecting → Open → Closed`, and `Closed → Connecting` only through
/// an explicit `connect()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
}

/// Snapshot of a session, for status endpoints and debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub session_id: String,

    pub state: ConnectionState,

    /// Set by `disconnect()`, cleared when a connection opens
    pub manual_close_requested: bool,

    /// Whether this connection already delivered its initial message
    pub initial_message_received: bool,

    /// Whether a request is waiting for its reply
    pub has_pending_response: bool,

    /// Envelopes waiting for the next open
    pub queued_envelopes: usize,

    /// When the current connection opened
    pub opened_at: Option<DateTime<Utc>>,
}
