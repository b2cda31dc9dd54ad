//! Local HTTP API for the application shell
//!
//! This module exposes the voice chat facade over HTTP:
//! - GET /health - Health check
//! - GET /session/status - Connection snapshot
//! - POST /session/connect, POST /session/disconnect
//! - POST /voice/... - One route per intent
//! - POST /artifacts/sweep - Delete expired voice replies

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
