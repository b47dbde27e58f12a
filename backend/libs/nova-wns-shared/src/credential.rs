use std::fmt;

pub const CLIENT_ID_ENV: &str = "WNS_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "WNS_CLIENT_SECRET";

/// Application credentials registered with the Windows Notification Service
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub client_id: String,
    pub client_secret: String,
}

impl Credential {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Coalescing key for token requests issued under this credential
    pub fn key(&self) -> CredentialKey {
        CredentialKey(format!("{}:{}", self.client_secret, self.client_id))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// `client_secret:client_id`
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CredentialKey(String);

impl fmt::Debug for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The key embeds the secret.
        f.write_str("CredentialKey(<redacted>)")
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Non-empty value of an environment variable
pub(crate) fn env_var(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}
