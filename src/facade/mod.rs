//! Intent-level API over the voice session
//!
//! `VoiceChat` is constructed once by the host and shared (usually behind an
//! `Arc`). Each intent fixes the message / server action pair so callers never
//! build protocol envelopes by hand.

mod actions;
mod intents;

pub use actions::{ActionHandler, ActionRegistry};
pub use intents::Intent;

use anyhow::Result as AnyResult;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::artifacts::{ArtifactConfig, ArtifactJanitor, ArtifactStore, FsArtifactStore, SweepReport};
use crate::credentials::CredentialProvider;
use crate::error::Result;
use crate::protocol::{InboundEnvelope, OutboundEnvelope, SessionResult};
use crate::session::{ConnectionInfo, SessionConfig, TransportSession};
use crate::transport::Connector;

/// Facade status: the connection snapshot plus registered client actions
#[derive(Debug, Clone, Serialize)]
pub struct VoiceChatStatus {
    #[serde(flatten)]
    pub connection: ConnectionInfo,
    pub registered_actions: Vec<String>,
}

/// Voice chat service used by the application shell
pub struct VoiceChat {
    session: TransportSession,
    janitor: ArtifactJanitor,
    actions: ActionRegistry,
}

impl VoiceChat {
    pub fn new(session: TransportSession, janitor: ArtifactJanitor) -> Self {
        Self {
            session,
            janitor,
            actions: ActionRegistry::new(),
        }
    }

    /// Wire a session and janitor over one filesystem artifact store
    pub fn build(
        session_config: SessionConfig,
        artifact_config: ArtifactConfig,
        connector: Arc<dyn Connector>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> AnyResult<Self> {
        let store: Arc<dyn ArtifactStore> = Arc::new(FsArtifactStore::new(artifact_config.dir.clone())?);

        let session_config = SessionConfig {
            artifact_prefix: artifact_config.prefix.clone(),
            ..session_config
        };

        let session = TransportSession::new(session_config, connector, credentials, Arc::clone(&store));
        let janitor = ArtifactJanitor::new(store, artifact_config.prefix, artifact_config.retention);

        Ok(Self::new(session, janitor))
    }

    pub fn session(&self) -> &TransportSession {
        &self.session
    }

    pub async fn connect(&self) -> Result<()> {
        self.session.connect().await
    }

    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    /// Free-form message with optional server action and payload
    pub async fn send_message(
        &self,
        message: &str,
        server_action: Option<&str>,
        data: Option<Value>,
    ) -> Result<SessionResult> {
        let envelope = OutboundEnvelope::new(message, server_action.map(str::to_string), data);
        self.session.request(envelope).await
    }

    /// Today's medication routine, read out by voice
    pub async fn routine_today(&self) -> Result<SessionResult> {
        self.session.request(Intent::RoutineToday.envelope(None)).await
    }

    pub async fn register_prescription(&self) -> Result<SessionResult> {
        self.session
            .request(Intent::RegisterPrescription.envelope(None))
            .await
    }

    /// Upload a prescription photo (base64-encoded image)
    pub async fn upload_prescription_photo(&self, image_base64: &str) -> Result<SessionResult> {
        self.session
            .request(Intent::UploadPrescriptionPhoto.envelope(Some(Value::from(image_base64))))
            .await
    }

    pub async fn register_routine_list(&self, routines: Vec<Value>) -> Result<SessionResult> {
        self.session
            .request(Intent::RegisterRoutineList.envelope(Some(Value::Array(routines))))
            .await
    }

    pub async fn capture_pills_photo(&self) -> Result<SessionResult> {
        self.session
            .request(Intent::CapturePillsPhoto.envelope(None))
            .await
    }

    /// Upload a pill photo (base64-encoded image)
    pub async fn upload_pills_photo(&self, image_base64: &str) -> Result<SessionResult> {
        self.session
            .request(Intent::UploadPillsPhoto.envelope(Some(Value::from(image_base64))))
            .await
    }

    pub async fn search_medicines(&self, query: &str) -> Result<SessionResult> {
        self.session.request(Intent::search(query)).await
    }

    /// Callback for the server's greeting after each connect
    pub fn set_initial_message_hook<F>(&self, hook: F)
    where
        F: Fn(InboundEnvelope) + Send + Sync + 'static,
    {
        self.session.set_initial_message_hook(hook);
    }

    pub fn register_action_handler<F>(&self, action: &str, handler: F)
    where
        F: Fn(Option<&Value>, &SessionResult) + Send + Sync + 'static,
    {
        self.actions.register(action, handler);
    }

    pub fn action_handler(&self, action: &str) -> Option<ActionHandler> {
        self.actions.get(action)
    }

    /// Run the handler registered for `result.action`, if any
    pub fn route_action(&self, result: &SessionResult) -> bool {
        self.actions.route(result)
    }

    /// Delete expired audio artifacts
    pub async fn sweep_artifacts(&self) -> AnyResult<SweepReport> {
        self.janitor.sweep().await
    }

    /// `sweep_artifacts` reduced to a success flag
    pub async fn cleanup_artifacts(&self) -> bool {
        match self.janitor.sweep().await {
            Ok(report) => {
                info!("Removed {} expired voice replies", report.removed);
                true
            }
            Err(e) => {
                error!("Artifact cleanup failed: {:#}", e);
                false
            }
        }
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        self.session.connection_info()
    }

    pub fn status(&self) -> VoiceChatStatus {
        VoiceChatStatus {
            connection: self.connection_info(),
            registered_actions: self.actions.actions(),
        }
    }
}
