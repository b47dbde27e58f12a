use std::time::Duration;

use serde::Deserialize;

use crate::credential::{non_empty, Credential};
use crate::errors::WnsError;

pub const DEFAULT_TOKEN_URL: &str = "https://login.live.com/accesstoken.srf";
pub const DEFAULT_SCOPE: &str = "notify.windows.com";

/// WNS Configuration
///
/// Loaded from `WNS_*` environment variables by [`WnsConfig::from_env`]:
/// `WNS_CLIENT_ID`, `WNS_CLIENT_SECRET`, `WNS_TOKEN_URL`, `WNS_SCOPE`,
/// `WNS_REQUEST_TIMEOUT_SECS`.
#[derive(Debug, Clone, Deserialize)]
pub struct WnsConfig {
    /// OAuth token endpoint of the identity provider
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Scope requested in the client_credentials grant
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Default client id used when a send does not carry one
    #[serde(default)]
    pub client_id: Option<String>,

    /// Default client secret used when a send does not carry one
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Per-request timeout; unset leaves the transport defaults in place
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

impl Default for WnsConfig {
    fn default() -> Self {
        Self {
            token_url: default_token_url(),
            scope: default_scope(),
            client_id: None,
            client_secret: None,
            request_timeout_secs: None,
        }
    }
}

impl WnsConfig {
    /// Load configuration from `.env` and `WNS_*` environment variables
    pub fn from_env() -> Result<Self, WnsError> {
        dotenvy::dotenv().ok();

        envy::prefixed("WNS_")
            .from_env::<WnsConfig>()
            .map_err(|e| WnsError::Config(e.to_string()))
    }

    /// Override the token endpoint
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Set default credentials for sends that do not carry their own
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.client_id = Some(credential.client_id);
        self.client_secret = Some(credential.client_secret);
        self
    }

    /// Set a per-request timeout on the underlying HTTP client
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub(crate) fn default_client_id(&self) -> Option<String> {
        non_empty(self.client_id.clone())
    }

    pub(crate) fn default_client_secret(&self) -> Option<String> {
        non_empty(self.client_secret.clone())
    }

    pub(crate) fn validate(&self) -> Result<(), WnsError> {
        reqwest::Url::parse(&self.token_url)
            .map_err(|e| WnsError::Config(format!("invalid token_url {}: {}", self.token_url, e)))?;
        if self.scope.is_empty() {
            return Err(WnsError::Config("scope must not be empty".to_string()));
        }
        Ok(())
    }
}
