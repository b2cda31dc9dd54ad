#![allow(dead_code)]

use anyhow::{anyhow, Result};
use medeasy_voice::artifacts::{ArtifactStore, FsArtifactStore};
use medeasy_voice::credentials::{CredentialProvider, StaticCredentials};
use medeasy_voice::session::{SessionConfig, TransportSession};
use medeasy_voice::transport::{Connector, LinkDriver, Outgoing, TransportEvent, TransportLink};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub const TOKEN: &str = "test-token";

/// How long a test waits for something that should happen
pub const WAIT: Duration = Duration::from_secs(2);

/// Links opened by a `MockConnector`, with the URL each was opened for
pub type Links = mpsc::UnboundedReceiver<(String, LinkDriver)>;

/// In-memory connector; every opened link is handed to the test to drive
pub struct MockConnector {
    links: mpsc::UnboundedSender<(String, LinkDriver)>,
}

impl MockConnector {
    pub fn new() -> (Arc<Self>, Links) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { links: tx }), rx)
    }
}

impl Connector for MockConnector {
    fn open(&self, url: &str) -> TransportLink {
        let (link, driver) = TransportLink::pair();
        let _ = self.links.send((url.to_string(), driver));
        link
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub fn session_with(
    config: SessionConfig,
    credentials: Arc<dyn CredentialProvider>,
    dir: &Path,
) -> Result<(TransportSession, Links)> {
    let (connector, links) = MockConnector::new();
    let store = Arc::new(FsArtifactStore::new(dir)?);
    let session = TransportSession::new(config, connector, credentials, store);
    Ok((session, links))
}

/// Session with a valid token over a caller-provided artifact store
pub fn session_with_store(store: Arc<dyn ArtifactStore>) -> (TransportSession, Links) {
    let (connector, links) = MockConnector::new();
    let session = TransportSession::new(
        SessionConfig::default(),
        connector,
        Arc::new(StaticCredentials::new(TOKEN)),
        store,
    );
    (session, links)
}

/// Session with a valid token and default config
pub fn session(dir: &Path) -> Result<(TransportSession, Links)> {
    session_with(
        SessionConfig::default(),
        Arc::new(StaticCredentials::new(TOKEN)),
        dir,
    )
}

pub async fn next_link(links: &mut Links) -> Result<(String, LinkDriver)> {
    tokio::time::timeout(WAIT, links.recv())
        .await
        .map_err(|_| anyhow!("no link was opened"))?
        .ok_or_else(|| anyhow!("connector dropped"))
}

/// Next text frame written by the session, parsed as JSON
pub async fn next_frame(driver: &mut LinkDriver) -> Result<Value> {
    match tokio::time::timeout(WAIT, driver.outgoing.recv()).await {
        Ok(Some(Outgoing::Text(frame))) => Ok(serde_json::from_str(&frame)?),
        Ok(Some(Outgoing::Close)) => Err(anyhow!("expected a text frame, got close")),
        Ok(None) => Err(anyhow!("link writer dropped")),
        Err(_) => Err(anyhow!("no frame was sent")),
    }
}

pub fn deliver(driver: &LinkDriver, frame: Value) {
    let _ = driver.events.send(TransportEvent::Message(frame.to_string()));
}

pub fn open(driver: &LinkDriver) {
    let _ = driver.events.send(TransportEvent::Open);
}

/// Connect `session` over a fresh mock link and return its driver
pub async fn connect_open(session: &TransportSession, links: &mut Links) -> Result<LinkDriver> {
    let connecting = {
        let session = session.clone();
        tokio::spawn(async move { session.connect().await })
    };

    let (_, driver) = next_link(links).await?;
    open(&driver);
    connecting.await??;

    Ok(driver)
}
