//! Wire protocol for the voice server
//!
//! JSON text frames in both directions. There is no request ID: a reply is
//! correlated with the single outstanding request.

pub mod messages;

pub use messages::{
    InboundEnvelope, OutboundEnvelope, SessionResult, DEFAULT_AUDIO_FORMAT, RESULT_OK,
};
