//! Bearer credential lookup for the connection URL

use async_trait::async_trait;
use tracing::debug;

/// Supplies the access token attached when a connection is opened
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current access token, or `None` when the user is not logged in
    async fn access_token(&self) -> Option<String>;
}

/// Fixed token (tests, one-shot CLI runs)
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Provider that never has a token
    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn access_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Reads the token from an environment variable on every connect
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn access_token(&self) -> Option<String> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Some(token.trim().to_string()),
            _ => {
                debug!("No access token in ${}", self.var);
                None
            }
        }
    }
}
