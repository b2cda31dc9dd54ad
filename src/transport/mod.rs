//! Message-oriented transport links
//!
//! A link is one opened connection, seen by the session as an outgoing command
//! channel and an incoming stream of tagged `TransportEvent`s.

pub mod link;
pub mod ws;

pub use link::{Connector, LinkDriver, Outgoing, TransportEvent, TransportLink};
pub use ws::WsConnector;
