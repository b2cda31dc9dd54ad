use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::artifacts::DEFAULT_PREFIX;

/// Voice server endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "wss://ai.medeasy.dev/ws/message/voice";

/// Configuration for a transport session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Secure WebSocket endpoint of the voice server
    pub endpoint: String,

    /// Query parameter carrying the bearer credential
    /// Default: "jwt_token"
    pub token_param: String,

    /// Authorization scheme prepended to the token
    /// Default: "Bearer"
    pub token_scheme: String,

    /// File name prefix for audio artifacts
    pub artifact_prefix: String,

    /// Give up on a reply after this long
    /// Default: None (a request without a reply waits forever)
    pub request_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token_param: "jwt_token".to_string(),
            token_scheme: "Bearer".to_string(),
            artifact_prefix: DEFAULT_PREFIX.to_string(),
            request_timeout: None,
        }
    }
}

impl SessionConfig {
    /// Connection URL with the credential attached as a query parameter
    pub fn connection_url(&self, token: &str) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        let credential = format!("{} {}", self.token_scheme, token);

        format!(
            "{}{}{}={}",
            self.endpoint,
            separator,
            self.token_param,
            urlencoding::encode(&credential)
        )
    }
}
