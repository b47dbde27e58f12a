use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use tracing::debug;

use crate::broker::TokenBroker;
use crate::config::WnsConfig;
use crate::context::{SendContext, SendHandle};
use crate::credential::{env_var, non_empty, Credential, CLIENT_ID_ENV, CLIENT_SECRET_ENV};
use crate::errors::WnsError;
use crate::models::{NotificationType, SendOptions};
use crate::payload::{render_template, Badge};
use crate::templates::{Template, TemplateParams};

/// Windows Notification Service Client
///
/// Sends tile, toast, badge and raw notifications to WNS channel URIs.
/// Access tokens are obtained on demand with the OAuth client_credentials
/// grant; concurrent sends under the same credential share a single token
/// request.
///
/// All send operations validate their input synchronously and return a
/// [`SendHandle`] that resolves once the notification has been delivered or
/// has failed. They must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct WnsClient {
    config: WnsConfig,
    broker: Arc<TokenBroker>,
}

impl WnsClient {
    /// Create new WNS client
    pub fn new(config: WnsConfig) -> Result<Self, WnsError> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| WnsError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_http_client(config, http_client))
    }

    /// Create a client from `WNS_*` environment variables
    pub fn from_env() -> Result<Self, WnsError> {
        Self::new(WnsConfig::from_env()?)
    }

    /// Create a client on top of an existing HTTP client
    pub fn with_http_client(config: WnsConfig, http_client: reqwest::Client) -> Self {
        let broker = TokenBroker::new(http_client, &config);
        Self { config, broker }
    }

    pub fn config(&self) -> &WnsConfig {
        &self.config
    }

    /// Send a pre-formatted payload to a channel.
    ///
    /// Without `options.access_token` a token is always requested first. With
    /// one, the notification goes out immediately unless a token request for
    /// the same credential is already in flight, in which case it waits for
    /// that token. A 401 on a caller-supplied token triggers one refresh and
    /// retry.
    pub fn send(
        &self,
        channel: &str,
        payload: impl Into<String>,
        notification_type: NotificationType,
        options: SendOptions,
    ) -> Result<SendHandle, WnsError> {
        let channel = parse_channel(channel)?;
        self.submit(channel, payload.into(), notification_type, options)
    }

    /// Send a badge update
    pub fn send_badge(
        &self,
        channel: &str,
        badge: impl Into<Badge>,
        options: SendOptions,
    ) -> Result<SendHandle, WnsError> {
        let payload = badge.into().to_xml()?;
        let channel = parse_channel(channel)?;
        self.submit(channel, payload, NotificationType::Badge, options)
    }

    /// Render a tile or toast template and send it
    pub fn send_template(
        &self,
        channel: &str,
        template: Template,
        params: &TemplateParams,
        options: SendOptions,
    ) -> Result<SendHandle, WnsError> {
        let channel = parse_channel(channel)?;
        let payload = render_template(template, params, &options.toast)?;
        self.submit(channel, payload, template.notification_type(), options)
    }

    /// Number of credentials with a token request in flight
    pub fn pending_credentials(&self) -> usize {
        self.broker.pending_credentials()
    }

    fn submit(
        &self,
        channel: Url,
        payload: String,
        notification_type: NotificationType,
        options: SendOptions,
    ) -> Result<SendHandle, WnsError> {
        if matches!(options.access_token.as_deref(), Some("")) {
            return Err(WnsError::validation(
                "If options.accessToken is specified, it must be a non-empty string.",
            ));
        }
        let credential = self.resolve_credential(&options)?;
        let headers = header_overrides(&options.headers)?;

        tokio::runtime::Handle::try_current().map_err(|_| {
            WnsError::Config("WNS sends must be started from within a Tokio runtime".to_string())
        })?;

        debug!(
            "Sending {} notification to {} for client {}",
            notification_type,
            channel.host_str().unwrap_or("<none>"),
            credential.client_id
        );

        let has_static_token = options.access_token.is_some();
        let (context, handle) = SendContext::new(
            channel,
            notification_type,
            payload,
            credential,
            options.access_token,
            headers,
        );

        if has_static_token {
            if let Some(context) = self.broker.enqueue_if_pending(context) {
                let broker = Arc::clone(&self.broker);
                tokio::spawn(async move {
                    broker.dispatcher().dispatch(context).await;
                });
            }
        } else {
            self.broker.request_token(context);
        }

        Ok(handle)
    }

    /// Options first, then configured defaults, then the process environment
    fn resolve_credential(&self, options: &SendOptions) -> Result<Credential, WnsError> {
        let client_id = non_empty(options.client_id.clone())
            .or_else(|| self.config.default_client_id())
            .or_else(|| env_var(CLIENT_ID_ENV));
        let client_secret = non_empty(options.client_secret.clone())
            .or_else(|| self.config.default_client_secret())
            .or_else(|| env_var(CLIENT_SECRET_ENV));

        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(Credential::new(client_id, client_secret)),
            _ => Err(WnsError::validation(
                "The options.client_id and options.client_secret must be specified as strings or the WNS_CLIENT_ID and WNS_CLIENT_SECRET environment variables must be set.",
            )),
        }
    }
}

fn parse_channel(channel: &str) -> Result<Url, WnsError> {
    let invalid = || WnsError::validation("The channel parameter must be the channel URI string.");

    let url = Url::parse(channel).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "https" | "http") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}

fn header_overrides(headers: &[(String, String)]) -> Result<HeaderMap, WnsError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            WnsError::validation(format!("Invalid header override {}: {}", name, e))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            WnsError::validation(format!("Invalid header override {}: {}", name, e))
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
