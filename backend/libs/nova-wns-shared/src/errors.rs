use std::sync::Arc;

use reqwest::header::HeaderMap;
use thiserror::Error;

/// WNS Client Error Types
///
/// Token failures are fanned out to every request queued behind the same
/// credential, so the error is `Clone`; transport errors are shared via `Arc`.
#[derive(Error, Debug, Clone)]
pub enum WnsError {
    /// Input rejected before any network call was made
    #[error("{0}")]
    Validation(String),

    #[error("Unable to obtain access token for WNS. HTTP status code: {status_code}. HTTP response body: {body}")]
    TokenRejected {
        status_code: u16,
        headers: HeaderMap,
        body: String,
    },

    #[error("Unable to obtain access token for WNS. Invalid response body: {body}")]
    TokenInvalidResponse {
        status_code: u16,
        headers: HeaderMap,
        body: String,
        reason: String,
    },

    #[error("Unable to send request for access token to Windows Notification Service: {0}")]
    TokenTransport(#[source] Arc<reqwest::Error>),

    #[error("{message}")]
    Notification {
        status_code: u16,
        headers: HeaderMap,
        notification_status: Option<String>,
        new_access_token: Option<String>,
        message: String,
    },

    #[error("Unable to send HTTPS request to Windows Notification Service: {source}")]
    Transport {
        new_access_token: Option<String>,
        #[source]
        source: Arc<reqwest::Error>,
    },

    #[error("WNS configuration error: {0}")]
    Config(String),

    #[error("Notification request was dropped before it completed")]
    Canceled,
}

impl WnsError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        WnsError::Validation(message.into())
    }

    /// HTTP status code of the response that caused this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::TokenRejected { status_code, .. }
            | Self::TokenInvalidResponse { status_code, .. }
            | Self::Notification { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Response headers of the response that caused this error, if any
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            Self::TokenRejected { headers, .. }
            | Self::TokenInvalidResponse { headers, .. }
            | Self::Notification { headers, .. } => Some(headers),
            _ => None,
        }
    }

    /// Access token obtained during the failed send, if one was issued
    pub fn new_access_token(&self) -> Option<&str> {
        match self {
            Self::Notification {
                new_access_token, ..
            }
            | Self::Transport {
                new_access_token, ..
            } => new_access_token.as_deref(),
            _ => None,
        }
    }

    /// True for failures a caller may reasonably retry later.
    ///
    /// The client itself never retries beyond the single 401 token refresh.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TokenTransport(_) | Self::Transport { .. } => true,
            Self::TokenRejected { status_code, .. } => *status_code >= 500,
            Self::Notification { status_code, .. } => {
                *status_code == 406 || *status_code >= 500
            }
            _ => false,
        }
    }

    /// True when the channel URI should be discarded (expired or unknown)
    pub fn is_channel_invalid(&self) -> bool {
        matches!(
            self,
            Self::Notification {
                status_code: 404 | 410,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification_error(status_code: u16) -> WnsError {
        WnsError::Notification {
            status_code,
            headers: HeaderMap::new(),
            notification_status: None,
            new_access_token: Some("T".to_string()),
            message: "failed".to_string(),
        }
    }

    #[test]
    fn test_token_rejected_message() {
        let err = WnsError::TokenRejected {
            status_code: 400,
            headers: HeaderMap::new(),
            body: "{\"error\":\"invalid_client\"}".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Unable to obtain access token for WNS. HTTP status code: 400. HTTP response body: {\"error\":\"invalid_client\"}"
        );
        assert_eq!(err.status_code(), Some(400));
        assert!(err.headers().is_some());
        assert!(err.new_access_token().is_none());
    }

    #[test]
    fn test_notification_error_accessors() {
        let err = notification_error(410);

        assert_eq!(err.status_code(), Some(410));
        assert_eq!(err.new_access_token(), Some("T"));
        assert!(err.is_channel_invalid());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(notification_error(503).is_retryable());
        assert!(notification_error(406).is_retryable());
        assert!(!notification_error(400).is_retryable());
        assert!(!WnsError::validation("bad").is_retryable());
        assert!(!WnsError::Canceled.is_retryable());
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = WnsError::validation("The channel parameter must be the channel URI string.");
        assert_eq!(
            err.to_string(),
            "The channel parameter must be the channel URI string."
        );
    }
}
