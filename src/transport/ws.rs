use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, error, info, warn};

use super::link::{Connector, LinkDriver, Outgoing, TransportEvent, TransportLink};

/// Close code reported when the connection ends without a close frame
const ABNORMAL_CLOSURE: u16 = 1006;

/// WebSocket connector backed by tokio-tungstenite
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    fn open(&self, url: &str) -> TransportLink {
        let (link, driver) = TransportLink::pair();
        tokio::spawn(run_link(url.to_string(), driver));
        link
    }

    fn name(&self) -> &str {
        "websocket"
    }
}

/// Owns one WebSocket for its whole lifetime
async fn run_link(url: String, driver: LinkDriver) {
    let LinkDriver {
        mut outgoing,
        events,
    } = driver;

    info!("Opening WebSocket to {}", redact(&url));

    let ws = match connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            error!("WebSocket connect failed: {}", e);
            let _ = events.send(TransportEvent::Error(e.to_string()));
            let _ = events.send(TransportEvent::Closed {
                code: ABNORMAL_CLOSURE,
                reason: "connect failed".to_string(),
            });
            return;
        }
    };

    let _ = events.send(TransportEvent::Open);
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            command = outgoing.recv() => match command {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        error!("Failed to send frame: {}", e);
                        let _ = events.send(TransportEvent::Error(e.to_string()));
                        let _ = events.send(TransportEvent::Closed {
                            code: ABNORMAL_CLOSURE,
                            reason: "send failed".to_string(),
                        });
                        break;
                    }
                }
                Some(Outgoing::Close) | None => {
                    debug!("Closing WebSocket");
                    if let Err(e) = sink.send(Message::Close(None)).await {
                        debug!("Close frame not delivered: {}", e);
                    }
                    let _ = events.send(TransportEvent::Closed {
                        code: 1000,
                        reason: "closed by client".to_string(),
                    });
                    break;
                }
            },
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(TransportEvent::Message(text));
                }
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => {
                        let _ = events.send(TransportEvent::Message(text));
                    }
                    Err(e) => warn!("Dropping non UTF-8 binary frame: {}", e),
                },
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.into_owned()))
                        .unwrap_or((ABNORMAL_CLOSURE, String::new()));
                    let _ = events.send(TransportEvent::Closed { code, reason });
                    break;
                }
                // Ping/pong handled by tungstenite
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    error!("WebSocket error: {}", e);
                    let _ = events.send(TransportEvent::Error(e.to_string()));
                    let _ = events.send(TransportEvent::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: e.to_string(),
                    });
                    break;
                }
                None => {
                    let _ = events.send(TransportEvent::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: "stream ended".to_string(),
                    });
                    break;
                }
            }
        }
    }

    debug!("WebSocket link task ended");
}

/// Strip the query string so credentials never reach the logs
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
