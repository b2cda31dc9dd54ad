use tokio::sync::mpsc;

/// Command for the writer side of a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// Send a UTF-8 text frame
    Text(String),
    /// Initiate a graceful close
    Close,
}

/// Event produced by a link, consumed by a single dispatch routine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection established
    Open,
    /// A text frame was received
    Message(String),
    /// Transport or protocol error
    Error(String),
    /// Connection closed (locally or by the remote)
    Closed {
        /// WebSocket close code (1000 = normal, 1006 = abnormal)
        code: u16,
        reason: String,
    },
}

/// Session-side ends of one opened connection
#[derive(Debug)]
pub struct TransportLink {
    pub outgoing: mpsc::UnboundedSender<Outgoing>,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Connector-side ends of one opened connection
#[derive(Debug)]
pub struct LinkDriver {
    pub outgoing: mpsc::UnboundedReceiver<Outgoing>,
    pub events: mpsc::UnboundedSender<TransportEvent>,
}

impl TransportLink {
    /// Create a connected pair of link ends
    pub fn pair() -> (TransportLink, LinkDriver) {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        (
            TransportLink {
                outgoing: outgoing_tx,
                events: events_rx,
            },
            LinkDriver {
                outgoing: outgoing_rx,
                events: events_tx,
            },
        )
    }
}

/// Opens message-oriented links
///
/// Implementations:
/// - `WsConnector`: WebSocket over TLS (production)
/// - in-memory connectors for tests, driving `LinkDriver` by hand
pub trait Connector: Send + Sync {
    /// Start opening a link to `url`
    ///
    /// Returns immediately. The link reports `TransportEvent::Open` once it is
    /// usable, or `Error`/`Closed` if it never becomes usable.
    fn open(&self, url: &str) -> TransportLink;

    /// Connector name for logging
    fn name(&self) -> &str;
}
