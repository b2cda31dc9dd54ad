use super::config::SessionConfig;
use super::state::{ConnectionInfo, ConnectionState};
use crate::artifacts::{is_name_taken, ArtifactName, ArtifactStore};
use crate::credentials::CredentialProvider;
use crate::error::{Result, SessionError};
use crate::protocol::{InboundEnvelope, OutboundEnvelope, SessionResult};
use crate::transport::{Connector, Outgoing, TransportEvent};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Names tried before giving up on saving one audio reply
const MAX_NAME_ATTEMPTS: u32 = 16;

/// Receives the server-pushed initial message of a connection
pub type InitialMessageHook = Arc<dyn Fn(InboundEnvelope) + Send + Sync>;

type PendingResponse = oneshot::Sender<Result<SessionResult>>;

/// A session owning one logical connection to the voice server
///
/// Cloning is cheap; clones share the same connection, queue and pending slot.
#[derive(Clone)]
pub struct TransportSession {
    shared: Arc<Shared>,
}

struct Shared {
    /// Identifier used in logs and status snapshots
    session_id: String,

    config: SessionConfig,
    connector: Arc<dyn Connector>,
    credentials: Arc<dyn CredentialProvider>,
    store: Arc<dyn ArtifactStore>,

    /// Connection state, queue and pending slot; never held across `.await`
    inner: Mutex<Inner>,

    /// Held by the one request in flight; later requests wait their turn
    request_slot: tokio::sync::Mutex<()>,
}

struct Inner {
    state: ConnectionState,
    manual_close_requested: bool,

    /// Incremented for every link opened or abandoned; stale events are ignored
    generation: u64,

    /// Writer side of the current link
    outgoing: Option<mpsc::UnboundedSender<Outgoing>>,

    /// Envelopes sent while not open, flushed FIFO on the next open
    queue: VecDeque<OutboundEnvelope>,

    /// The single outstanding request
    pending: Option<PendingResponse>,

    /// Callers of `wait_for_connection()`
    connect_waiters: Vec<oneshot::Sender<()>>,

    /// The `connect()` call waiting for the current link to open
    handshake: Option<oneshot::Sender<Result<()>>>,

    /// Requests that joined a handshake started by another caller
    handshake_followers: Vec<oneshot::Sender<Result<()>>>,

    initial_hook: Option<InitialMessageHook>,
    initial_message_received: bool,

    opened_at: Option<DateTime<Utc>>,
}

/// Where an inbound frame goes
enum Route {
    Initial(InitialMessageHook),
    Pending,
    Drop(&'static str),
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn release_waiters(&mut self) {
        for waiter in self.connect_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }

    /// Settle the current handshake and every request following it
    fn finish_handshake<F>(&mut self, outcome: F)
    where
        F: Fn() -> Result<()>,
    {
        if let Some(handshake) = self.handshake.take() {
            let _ = handshake.send(outcome());
        }
        for follower in self.handshake_followers.drain(..) {
            let _ = follower.send(outcome());
        }
    }

    /// Send everything queued while the connection was not open
    fn flush_queue(&mut self) -> usize {
        let Some(outgoing) = self.outgoing.clone() else {
            return 0;
        };

        let mut flushed = 0;
        while let Some(envelope) = self.queue.pop_front() {
            let frame = match envelope.to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Dropping unencodable envelope: {}", e);
                    continue;
                }
            };

            if outgoing.send(Outgoing::Text(frame)).is_err() {
                self.queue.push_front(envelope);
                break;
            }
            flushed += 1;
        }

        flushed
    }
}

impl TransportSession {
    /// Create an idle session; nothing is opened until `connect()` or `request()`
    pub fn new(
        config: SessionConfig,
        connector: Arc<dyn Connector>,
        credentials: Arc<dyn CredentialProvider>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        let session_id = format!("voice-{}", uuid::Uuid::new_v4());
        info!(
            "Creating voice session {} ({} connector)",
            session_id,
            connector.name()
        );

        Self {
            shared: Arc::new(Shared {
                session_id,
                config,
                connector,
                credentials,
                store,
                inner: Mutex::new(Inner {
                    state: ConnectionState::Idle,
                    manual_close_requested: false,
                    generation: 0,
                    outgoing: None,
                    queue: VecDeque::new(),
                    pending: None,
                    connect_waiters: Vec::new(),
                    handshake: None,
                    handshake_followers: Vec::new(),
                    initial_hook: None,
                    initial_message_received: false,
                    opened_at: None,
                }),
                request_slot: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.shared.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.lock().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn manual_close_requested(&self) -> bool {
        self.shared.lock().manual_close_requested
    }

    /// Register the callback for server-pushed initial messages
    pub fn set_initial_message_hook<F>(&self, hook: F)
    where
        F: Fn(InboundEnvelope) + Send + Sync + 'static,
    {
        debug!("Initial message hook registered");
        self.shared.lock().initial_hook = Some(Arc::new(hook));
    }

    /// Open the connection
    ///
    /// Resolves once the link is open. Already open: returns at once and
    /// releases connection waiters. Already connecting: returns at once.
    pub async fn connect(&self) -> Result<()> {
        {
            let mut inner = self.shared.lock();
            match inner.state {
                ConnectionState::Open => {
                    debug!("Already connected");
                    inner.release_waiters();
                    return Ok(());
                }
                ConnectionState::Connecting => {
                    debug!("Connection attempt already in progress");
                    return Ok(());
                }
                ConnectionState::Idle | ConnectionState::Closed => {}
            }
        }

        let Some(token) = self.shared.credentials.access_token().await else {
            error!("No access token available, cannot connect");
            return Err(SessionError::Auth);
        };
        let url = self.shared.config.connection_url(&token);

        let (handshake_tx, handshake_rx) = oneshot::channel();
        let (generation, events) = {
            let mut inner = self.shared.lock();

            // Another caller may have connected while the token was fetched
            match inner.state {
                ConnectionState::Open => {
                    inner.release_waiters();
                    return Ok(());
                }
                ConnectionState::Connecting => return Ok(()),
                ConnectionState::Idle | ConnectionState::Closed => {}
            }

            inner.state = ConnectionState::Connecting;
            inner.generation += 1;
            let link = self.shared.connector.open(&url);
            inner.outgoing = Some(link.outgoing);
            inner.handshake = Some(handshake_tx);
            (inner.generation, link.events)
        };

        info!(
            "Connecting session {} to {}",
            self.shared.session_id, self.shared.config.endpoint
        );

        tokio::spawn(pump_events(Arc::downgrade(&self.shared), generation, events));

        match handshake_rx.await {
            Ok(result) => result,
            Err(_) => Err(SessionError::Disconnected),
        }
    }

    /// Wait until the connection is open
    ///
    /// Returns immediately when open; otherwise resolves on the next open.
    pub async fn wait_for_connection(&self) {
        let waiter = {
            let mut inner = self.shared.lock();
            if inner.state == ConnectionState::Open {
                return;
            }
            let (tx, rx) = oneshot::channel();
            inner.connect_waiters.push(tx);
            rx
        };

        let _ = waiter.await;
    }

    /// Transmit now if open (`true`), otherwise queue for the next open (`false`)
    pub fn send(&self, envelope: OutboundEnvelope) -> bool {
        let mut inner = self.shared.lock();

        if inner.state == ConnectionState::Open {
            if let Some(outgoing) = &inner.outgoing {
                match envelope.to_frame() {
                    Ok(frame) => {
                        if outgoing.send(Outgoing::Text(frame)).is_ok() {
                            debug!("Sent envelope: {}", envelope.message);
                            return true;
                        }
                    }
                    Err(e) => {
                        error!("Failed to encode envelope: {}", e);
                        return false;
                    }
                }
            }
        }

        inner.queue.push_back(envelope);
        debug!(
            "Not connected, envelope queued ({} waiting)",
            inner.queue.len()
        );
        false
    }

    /// Send one envelope and wait for its reply
    ///
    /// Only one request is in flight at a time; concurrent callers are served
    /// in the order they arrived. A configured `request_timeout` covers
    /// connecting as well as waiting for the reply.
    pub async fn request(&self, envelope: OutboundEnvelope) -> Result<SessionResult> {
        let _slot = self.shared.request_slot.lock().await;

        let (tx, rx) = oneshot::channel();
        {
            let mut inner = self.shared.lock();
            if inner.pending.replace(tx).is_some() {
                debug!("Discarding pending slot left by an abandoned request");
            }
        }

        let outcome = match self.shared.config.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.exchange(envelope, rx)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("No reply within {:?}, giving up", limit);
                    Err(SessionError::Timeout(limit))
                }
            },
            None => self.exchange(envelope, rx).await,
        };

        if outcome.is_err() {
            self.shared.lock().pending = None;
        }
        outcome
    }

    /// Connect if needed, transmit, then wait for the pending slot to settle
    async fn exchange(
        &self,
        envelope: OutboundEnvelope,
        reply: oneshot::Receiver<Result<SessionResult>>,
    ) -> Result<SessionResult> {
        if !self.is_open() {
            debug!("Not connected, connecting before request");
            self.connect().await?;
            self.join_handshake().await?;
        }

        // Settled while connecting (rejected by disconnect, or answered early)
        if self.shared.lock().pending.is_none() {
            debug!("Request settled before it was sent");
            return reply.await.unwrap_or(Err(SessionError::Disconnected));
        }

        info!(
            "Sending request: {} (action={:?})",
            envelope.message, envelope.server_action
        );
        if !self.send(envelope) {
            debug!("Connection dropped before sending, request queued for next open");
        }

        reply.await.unwrap_or(Err(SessionError::Disconnected))
    }

    /// Wait for the link being opened to succeed or fail
    async fn join_handshake(&self) -> Result<()> {
        let follower = {
            let mut inner = self.shared.lock();
            match inner.state {
                ConnectionState::Open => return Ok(()),
                ConnectionState::Connecting => {
                    let (tx, rx) = oneshot::channel();
                    inner.handshake_followers.push(tx);
                    rx
                }
                ConnectionState::Idle | ConnectionState::Closed => {
                    return Err(if inner.manual_close_requested {
                        SessionError::Disconnected
                    } else {
                        SessionError::Transport("connection closed before the request was sent".to_string())
                    });
                }
            }
        };

        follower.await.unwrap_or(Err(SessionError::Disconnected))
    }

    /// Close the connection on purpose
    ///
    /// Idempotent. A request still connecting or waiting for its reply fails
    /// with `SessionError::Disconnected`. Callers of `wait_for_connection()`
    /// keep waiting for the next open.
    pub fn disconnect(&self) {
        let mut inner = self.shared.lock();

        inner.manual_close_requested = true;
        inner.generation += 1;
        inner.opened_at = None;

        if let Some(outgoing) = inner.outgoing.take() {
            info!("Closing session {}", self.shared.session_id);
            let _ = outgoing.send(Outgoing::Close);
        }

        if inner.state != ConnectionState::Idle {
            inner.state = ConnectionState::Closed;
        }

        inner.finish_handshake(|| Err(SessionError::Disconnected));

        if let Some(pending) = inner.pending.take() {
            warn!("Rejecting outstanding request on disconnect");
            let _ = pending.send(Err(SessionError::Disconnected));
        }
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        let inner = self.shared.lock();

        ConnectionInfo {
            session_id: self.shared.session_id.clone(),
            state: inner.state,
            manual_close_requested: inner.manual_close_requested,
            initial_message_received: inner.initial_message_received,
            has_pending_response: inner.pending.is_some(),
            queued_envelopes: inner.queue.len(),
            opened_at: inner.opened_at,
        }
    }

    /// Handle one event of link `generation`; `false` ends the pump
    async fn dispatch(&self, generation: u64, event: TransportEvent) -> bool {
        if self.shared.lock().generation != generation {
            debug!("Ignoring event from a superseded link");
            return false;
        }

        match event {
            TransportEvent::Open => {
                self.on_open();
                true
            }
            TransportEvent::Message(frame) => {
                self.on_frame(&frame).await;
                true
            }
            TransportEvent::Error(message) => {
                self.on_error(message);
                true
            }
            TransportEvent::Closed { code, reason } => {
                self.on_closed(code, &reason);
                false
            }
        }
    }

    fn on_open(&self) {
        let mut inner = self.shared.lock();

        inner.state = ConnectionState::Open;
        inner.manual_close_requested = false;
        inner.initial_message_received = false;
        inner.opened_at = Some(Utc::now());

        inner.finish_handshake(|| Ok(()));
        inner.release_waiters();
        let flushed = inner.flush_queue();

        info!(
            "Session {} connected ({} queued envelopes sent)",
            self.shared.session_id, flushed
        );
    }

    async fn on_frame(&self, frame: &str) {
        let envelope = match InboundEnvelope::decode(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Dropping frame: {}", e);
                return;
            }
        };

        debug!(
            "Received frame (result_code={}, action={:?})",
            envelope.result_code, envelope.client_action
        );

        let route = {
            let mut inner = self.shared.lock();
            if inner.pending.is_some() {
                Route::Pending
            } else if inner.initial_message_received {
                Route::Drop("no request is waiting for a reply")
            } else if let Some(hook) = inner.initial_hook.clone() {
                inner.initial_message_received = true;
                Route::Initial(hook)
            } else {
                Route::Drop("no initial message hook registered")
            }
        };

        match route {
            Route::Initial(hook) => {
                info!("Delivering initial message");
                hook(envelope);
            }
            Route::Pending => self.settle(envelope).await,
            Route::Drop(why) => {
                warn!(
                    "Dropping frame, {}: {}",
                    why,
                    envelope.text_message.as_deref().unwrap_or("")
                );
            }
        }
    }

    /// Resolve the pending request with this reply
    async fn settle(&self, envelope: InboundEnvelope) {
        let outcome = if envelope.is_success() {
            match self.persist_audio(&envelope).await {
                Ok(file_path) => Ok(SessionResult::from_envelope(envelope, file_path)),
                Err(e) => {
                    // The request keeps waiting; only this frame is lost
                    error!("Dropping reply: {}", e);
                    return;
                }
            }
        } else {
            warn!(
                "Server rejected request: {} {}",
                envelope.result_code,
                envelope.result_message.as_deref().unwrap_or("")
            );
            Err(envelope.server_error())
        };

        let pending = self.shared.lock().pending.take();
        match pending {
            Some(pending) => {
                if pending.send(outcome).is_err() {
                    debug!("Requester went away before the reply arrived");
                }
            }
            None => debug!("Request was cleared before its reply was settled"),
        }
    }

    /// Write the audio payload, if any, to the artifact store
    async fn persist_audio(&self, envelope: &InboundEnvelope) -> Result<Option<PathBuf>> {
        let Some(bytes) = envelope.decode_audio()? else {
            return Ok(None);
        };

        let mut name =
            ArtifactName::now(&self.shared.config.artifact_prefix, envelope.audio_format())?;
        let mut attempts = 1;
        let path = loop {
            match self.shared.store.write(&name.file_name(), &bytes).await {
                Ok(path) => break path,
                Err(e) if is_name_taken(&e) && attempts < MAX_NAME_ATTEMPTS => {
                    debug!("Artifact {} already exists, trying the next name", name.file_name());
                    name = name.next();
                    attempts += 1;
                }
                Err(e) => {
                    return Err(SessionError::Decode(format!(
                        "failed to write artifact: {:#}",
                        e
                    )))
                }
            }
        };

        info!("Saved voice reply to {}", path.display());
        Ok(Some(path))
    }

    fn on_error(&self, message: String) {
        error!("Transport error: {}", message);

        let mut inner = self.shared.lock();
        inner.state = ConnectionState::Closed;
        inner.opened_at = None;

        inner.finish_handshake(|| Err(SessionError::Transport(message.clone())));
    }

    fn on_closed(&self, code: u16, reason: &str) {
        let mut inner = self.shared.lock();

        inner.state = ConnectionState::Closed;
        inner.outgoing = None;
        inner.opened_at = None;

        inner.finish_handshake(|| {
            Err(SessionError::Transport(format!(
                "connection closed before opening (code={}, reason={})",
                code, reason
            )))
        });

        if inner.manual_close_requested {
            info!("Connection closed (code={})", code);
        } else {
            // No reconnect: callers see the drop on their next request
            warn!(
                "Connection lost (code={}, reason={}), not reconnecting",
                code, reason
            );
            if inner.pending.is_some() {
                warn!("A request is still waiting for a reply that will not arrive on this connection");
            }
        }
    }
}

/// Feed one link's events to the session, one at a time
async fn pump_events(
    shared: Weak<Shared>,
    generation: u64,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        let session = TransportSession { shared };
        if !session.dispatch(generation, event).await {
            break;
        }
    }

    debug!("Event pump for link {} stopped", generation);
}
