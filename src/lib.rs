pub mod artifacts;
pub mod config;
pub mod credentials;
pub mod error;
pub mod facade;
pub mod http;
pub mod protocol;
pub mod session;
pub mod transport;

pub use artifacts::{
    ArtifactConfig, ArtifactJanitor, ArtifactName, ArtifactStore, FsArtifactStore, SweepReport,
};
pub use config::Config;
pub use credentials::{CredentialProvider, EnvCredentials, StaticCredentials};
pub use error::{Result, SessionError};
pub use facade::{Intent, VoiceChat, VoiceChatStatus};
pub use http::{create_router, AppState};
pub use protocol::{InboundEnvelope, OutboundEnvelope, SessionResult};
pub use session::{ConnectionInfo, ConnectionState, SessionConfig, TransportSession};
pub use transport::{Connector, TransportEvent, TransportLink, WsConnector};
