use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use reqwest::header::HeaderMap;
use reqwest::Url;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::credential::{Credential, CredentialKey};
use crate::errors::WnsError;
use crate::models::{NotificationType, SendResult};

type Outcome = Result<SendResult, WnsError>;

/// One notification on its way to a channel.
///
/// Owned by the client while queued behind a token request and by the
/// dispatcher while in flight. Completing consumes the context, so the
/// outcome is delivered at most once.
pub(crate) struct SendContext {
    pub channel: Url,
    pub notification_type: NotificationType,
    pub payload: String,
    pub credential: Credential,
    /// Caller-supplied token, tried before requesting a fresh one
    pub access_token: Option<String>,
    /// Caller header overrides, applied last
    pub headers: HeaderMap,
    /// Token obtained by the broker on behalf of this send
    pub new_access_token: Option<String>,
    completion: oneshot::Sender<Outcome>,
}

impl SendContext {
    pub fn new(
        channel: Url,
        notification_type: NotificationType,
        payload: String,
        credential: Credential,
        access_token: Option<String>,
        headers: HeaderMap,
    ) -> (Self, SendHandle) {
        let (completion, rx) = oneshot::channel();
        let context = Self {
            channel,
            notification_type,
            payload,
            credential,
            access_token,
            headers,
            new_access_token: None,
            completion,
        };
        (context, SendHandle { rx })
    }

    pub fn key(&self) -> CredentialKey {
        self.credential.key()
    }

    /// Token to present in the `Authorization` header
    pub fn bearer_token(&self) -> Option<&str> {
        self.new_access_token
            .as_deref()
            .or(self.access_token.as_deref())
    }

    pub fn channel_host(&self) -> &str {
        self.channel.host_str().unwrap_or("<none>")
    }

    pub fn complete(self, outcome: Outcome) {
        let host = self.channel.host_str().unwrap_or("<none>").to_string();
        match self.completion.send(outcome) {
            Ok(()) => {}
            Err(Err(e)) => {
                warn!(
                    "WNS notification to {} failed with no one waiting for the result: {}",
                    host, e
                );
            }
            Err(Ok(result)) => {
                debug!(
                    "WNS notification to {} delivered (status {}), result handle was dropped",
                    host, result.status_code
                );
            }
        }
    }
}

/// Completion handle returned by the send operations.
///
/// Await it for the outcome, or drop it to fire and forget.
#[must_use = "dropping the handle discards the delivery outcome"]
#[derive(Debug)]
pub struct SendHandle {
    rx: oneshot::Receiver<Outcome>,
}

impl Future for SendHandle {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(WnsError::Canceled)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(access_token: Option<&str>) -> (SendContext, SendHandle) {
        SendContext::new(
            Url::parse("https://db5.notify.windows.com/?token=abc").unwrap(),
            NotificationType::Raw,
            "<payload/>".to_string(),
            Credential::new("id", "secret"),
            access_token.map(str::to_string),
            HeaderMap::new(),
        )
    }

    #[tokio::test]
    async fn test_complete_delivers_outcome() {
        let (ctx, handle) = context(None);
        ctx.complete(Ok(SendResult {
            status_code: 200,
            headers: HeaderMap::new(),
            new_access_token: Some("T".to_string()),
        }));

        let result = handle.await.unwrap();
        assert_eq!(result.status_code, 200);
        assert_eq!(result.new_access_token.as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn test_dropped_context_resolves_canceled() {
        let (ctx, handle) = context(None);
        drop(ctx);

        assert!(matches!(handle.await, Err(WnsError::Canceled)));
    }

    #[test]
    fn test_complete_with_dropped_handle_does_not_panic() {
        let (ctx, handle) = context(None);
        drop(handle);
        ctx.complete(Err(WnsError::Canceled));
    }

    #[test]
    fn test_bearer_token_prefers_new_token() {
        let (mut ctx, _handle) = context(Some("static"));
        assert_eq!(ctx.bearer_token(), Some("static"));

        ctx.new_access_token = Some("fresh".to_string());
        assert_eq!(ctx.bearer_token(), Some("fresh"));
    }

    #[test]
    fn test_channel_host() {
        let (ctx, _handle) = context(None);
        assert_eq!(ctx.channel_host(), "db5.notify.windows.com");
    }
}
