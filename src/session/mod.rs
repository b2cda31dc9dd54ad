//! Voice session management
//!
//! This module provides the `TransportSession` abstraction that manages:
//! - The single logical connection and its lifecycle state
//! - Queuing of envelopes sent before the connection is open
//! - Correlation of exactly one reply with exactly one request
//! - The server-pushed initial message
//! - Persisting audio replies as artifacts

mod config;
mod session;
mod state;

pub use config::{SessionConfig, DEFAULT_ENDPOINT};
pub use session::{InitialMessageHook, TransportSession};
pub use state::{ConnectionInfo, ConnectionState};
