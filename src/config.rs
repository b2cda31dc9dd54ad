use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::artifacts::{ArtifactConfig, DEFAULT_PREFIX};
use crate::session::{SessionConfig, DEFAULT_ENDPOINT};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub transport: TransportConfig,
    pub credentials: CredentialsConfig,
    pub artifacts: ArtifactsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub endpoint: String,
    pub token_param: String,
    pub token_scheme: String,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Environment variable holding the access token
    pub token_env: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Cache directory; `~` and `$VARS` are expanded
    pub dir: String,
    pub prefix: String,
    pub retention_hours: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "medeasy-voice".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8765,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token_param: session.token_param,
            token_scheme: session.token_scheme,
            request_timeout_secs: None,
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            token_env: "MEDEASY_ACCESS_TOKEN".to_string(),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir()
                .join("medeasy-voice")
                .display()
                .to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            retention_hours: 24,
        }
    }
}

impl Config {
    /// Load `path` (any format the `config` crate knows, extension optional)
    /// with `MEDEASY__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("MEDEASY").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            endpoint: self.transport.endpoint.clone(),
            token_param: self.transport.token_param.clone(),
            token_scheme: self.transport.token_scheme.clone(),
            artifact_prefix: self.artifacts.prefix.clone(),
            request_timeout: self.transport.request_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn artifact_config(&self) -> Result<ArtifactConfig> {
        let dir = shellexpand::full(&self.artifacts.dir)
            .with_context(|| format!("Failed to expand artifact directory {}", self.artifacts.dir))?;

        Ok(ArtifactConfig {
            dir: PathBuf::from(dir.as_ref()),
            prefix: self.artifacts.prefix.clone(),
            retention: Duration::from_secs(self.artifacts.retention_hours * 60 * 60),
        })
    }
}
