use std::fmt;
use std::str::FromStr;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::errors::WnsError;

/// WNS notification type, sent as the `X-WNS-Type` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Toast,
    Badge,
    Tile,
    Raw,
}

impl NotificationType {
    pub const ALL: [NotificationType; 4] = [
        NotificationType::Toast,
        NotificationType::Badge,
        NotificationType::Tile,
        NotificationType::Raw,
    ];

    pub fn as_header_value(&self) -> &'static str {
        match self {
            NotificationType::Toast => "wns/toast",
            NotificationType::Badge => "wns/badge",
            NotificationType::Tile => "wns/tile",
            NotificationType::Raw => "wns/raw",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_header_value())
    }
}

impl FromStr for NotificationType {
    type Err = WnsError;

    /// Accepts both `toast` and `wns/toast` spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.strip_prefix("wns/").unwrap_or(s);
        match bare {
            "toast" => Ok(NotificationType::Toast),
            "badge" => Ok(NotificationType::Badge),
            "tile" => Ok(NotificationType::Tile),
            "raw" => Ok(NotificationType::Raw),
            _ => {
                let valid = NotificationType::ALL
                    .iter()
                    .map(|t| t.as_header_value())
                    .collect::<Vec<_>>();
                Err(WnsError::validation(format!(
                    "The type parameter must specify the notification type. The value of {} is not in the set of valid value types: {}",
                    s,
                    json_list(&valid)
                )))
            }
        }
    }
}

/// Per-send options
///
/// `client_id` and `client_secret` fall back independently to the client's
/// configured defaults and then to `WNS_CLIENT_ID` / `WNS_CLIENT_SECRET`.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Previously obtained bearer token to try before requesting a new one
    pub access_token: Option<String>,
    /// Extra request headers; these win over the generated ones
    pub headers: Vec<(String, String)>,
    /// Only used by toast templates
    pub toast: ToastOptions,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.client_id = Some(credential.client_id);
        self.client_secret = Some(credential.client_secret);
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_toast(mut self, toast: ToastOptions) -> Self {
        self.toast = toast;
        self
    }
}

/// Toast-only presentation options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastOptions {
    pub duration: Option<ToastDuration>,
    /// Launch argument passed to the app; XML-escaped on render
    pub launch: Option<String>,
    pub audio: Option<ToastAudio>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastDuration {
    Long,
    Short,
}

impl ToastDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastDuration::Long => "long",
            ToastDuration::Short => "short",
        }
    }
}

impl FromStr for ToastDuration {
    type Err = WnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long" => Ok(ToastDuration::Long),
            "short" => Ok(ToastDuration::Short),
            _ => Err(WnsError::validation(format!(
                "The options.duration must be a string value from the following set: {}",
                json_list(&["long", "short"])
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastAudio {
    /// Bare sound name (`Mail`) or prefixed form (`ms-winsoundevent:Notification.Mail`)
    pub src: Option<String>,
    pub silent: bool,
    pub looping: bool,
}

/// Outcome of a delivered notification
#[derive(Debug, Clone)]
pub struct SendResult {
    pub status_code: u16,
    pub headers: HeaderMap,
    /// Token obtained while serving this send; callers may replay it via
    /// [`SendOptions::with_access_token`]
    pub new_access_token: Option<String>,
}

impl SendResult {
    /// Value of the `x-wns-msg-id` response header
    pub fn message_id(&self) -> Option<&str> {
        self.headers
            .get("x-wns-msg-id")
            .and_then(|v| v.to_str().ok())
    }
}

/// OAuth token response from the identity provider
#[derive(Debug, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
}

pub(crate) fn json_list(items: &[&str]) -> String {
    serde_json::to_string(items).unwrap_or_default()
}
