use std::sync::{Arc, Weak};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use tracing::{debug, info, warn};

use crate::broker::TokenBroker;
use crate::context::SendContext;
use crate::errors::WnsError;
use crate::models::SendResult;

pub const WNS_TYPE_HEADER: &str = "x-wns-type";
pub const NOTIFICATION_STATUS_HEADER: &str = "x-wns-notificationstatus";

/// Delivers notification payloads to channel URIs
pub(crate) struct NotificationDispatcher {
    http_client: reqwest::Client,
    broker: Weak<TokenBroker>,
}

/// How a single POST to a channel ended
#[derive(Debug)]
enum Delivery {
    Delivered(SendResult),
    /// 401 while presenting a caller-supplied token
    TokenExpired,
    Failed(WnsError),
}

impl NotificationDispatcher {
    pub fn new(http_client: reqwest::Client, broker: Weak<TokenBroker>) -> Self {
        Self {
            http_client,
            broker,
        }
    }

    /// Send the context's payload and complete it, except when a stale
    /// caller-supplied token is rejected: then the context goes back through
    /// the broker for a fresh token, once.
    pub async fn dispatch(&self, context: SendContext) {
        match self.deliver(&context).await {
            Delivery::Delivered(result) => {
                debug!(
                    "WNS notification delivered to {} ({})",
                    context.channel_host(),
                    context.notification_type
                );
                context.complete(Ok(result));
            }
            Delivery::TokenExpired => {
                info!(
                    "WNS rejected access token for client {}, requesting a new one",
                    context.credential.client_id
                );
                match self.broker.upgrade() {
                    Some(broker) => broker.request_token(context),
                    None => context.complete(Err(WnsError::Canceled)),
                }
            }
            Delivery::Failed(e) => {
                warn!(
                    "WNS notification to {} failed: {}",
                    context.channel_host(),
                    e
                );
                context.complete(Err(e));
            }
        }
    }

    async fn deliver(&self, context: &SendContext) -> Delivery {
        let headers = match build_headers(context) {
            Ok(headers) => headers,
            Err(e) => return Delivery::Failed(e),
        };

        let response = match self
            .http_client
            .post(context.channel.clone())
            .headers(headers)
            .body(context.payload.clone())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Delivery::Failed(WnsError::Transport {
                    new_access_token: context.new_access_token.clone(),
                    source: Arc::new(e),
                })
            }
        };

        let status_code = response.status().as_u16();
        let headers = response.headers().clone();

        // Drain the body so the connection can be reused.
        if let Err(e) = response.bytes().await {
            return Delivery::Failed(WnsError::Transport {
                new_access_token: context.new_access_token.clone(),
                source: Arc::new(e),
            });
        }

        classify(status_code, headers, context.new_access_token.clone())
    }
}

/// `Content-Type`, `Content-Length`, `X-WNS-Type` and `Authorization`, then
/// the caller's overrides on top.
fn build_headers(context: &SendContext) -> Result<HeaderMap, WnsError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/xml"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(context.payload.len()));
    headers.insert(
        WNS_TYPE_HEADER,
        HeaderValue::from_static(context.notification_type.as_header_value()),
    );

    let bearer = format!("Bearer {}", context.bearer_token().unwrap_or_default());
    let mut authorization = HeaderValue::from_str(&bearer)
        .map_err(|_| WnsError::validation("The access token contains characters not allowed in an HTTP header."))?;
    authorization.set_sensitive(true);
    headers.insert(AUTHORIZATION, authorization);

    for (name, value) in context.headers.iter() {
        headers.insert(name.clone(), value.clone());
    }

    Ok(headers)
}

fn classify(status_code: u16, headers: HeaderMap, new_access_token: Option<String>) -> Delivery {
    let notification_status = headers
        .get(NOTIFICATION_STATUS_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if status_code == 200 && notification_status.as_deref() == Some("received") {
        return Delivery::Delivered(SendResult {
            status_code,
            headers,
            new_access_token,
        });
    }

    // A token we just obtained being rejected is final; no refresh loop.
    if status_code == 401 && new_access_token.is_none() {
        return Delivery::TokenExpired;
    }

    let message = match status_message(status_code) {
        Some(message) => message.to_string(),
        None => format!(
            "Windows Notification Service returned HTTP status code {} with x-wns-notificationstatus value of {}",
            status_code,
            notification_status.as_deref().unwrap_or("undefined")
        ),
    };

    Delivery::Failed(WnsError::Notification {
        status_code,
        headers,
        notification_status,
        new_access_token,
        message,
    })
}

/// WNS send-notification response codes
pub fn status_message(status_code: u16) -> Option<&'static str> {
    let message = match status_code {
        400 => "One or more headers were specified incorrectly or conflict with another header.",
        401 => "The cloud service did not present a valid authentication ticket. The OAuth ticket may be invalid.",
        403 => "The cloud service is not authorized to send a notification to this URI even though they are authenticated.",
        404 => "The channel URI is not valid or is not recognized by WNS.",
        405 => "Invalid method (GET, DELETE, CREATE); only POST is allowed.",
        406 => "The cloud service exceeded its throttle limit.",
        410 => "The channel expired.",
        413 => "The notification payload exceeds the 5000 byte size limit.",
        500 => "An internal failure caused notification delivery to fail.",
        503 => "The server is currently unavailable.",
        _ => return None,
    };
    Some(message)
}
