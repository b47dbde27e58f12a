//! Nova WNS Shared Library
//!
//! This library provides a Windows Notification Service (WNS) client for
//! sending tile, toast, badge and raw push notifications to Windows devices
//! across the Nova platform.
//!
//! It handles:
//! - OAuth2 client_credentials token acquisition against the identity provider
//! - Coalescing of concurrent token requests per credential (single flight)
//! - Automatic single refresh-and-retry when a supplied token has expired
//! - Classification of WNS response codes into typed errors
//! - Tile/toast template rendering with XML escaping and badge payloads
//!
//! # Example
//!
//! ```rust,no_run
//! use nova_wns_shared::{Credential, SendOptions, Template, TemplateParams, WnsClient, WnsConfig};
//!
//! # async fn run() -> Result<(), nova_wns_shared::WnsError> {
//! let client = WnsClient::new(WnsConfig::default())?;
//! let options = SendOptions::new().with_credential(Credential::new("ms-app://s-1-15-2-...", "secret"));
//!
//! let result = client
//!     .send_template(
//!         "https://db5.notify.windows.com/?token=AwYAAAB...",
//!         Template::ToastText01,
//!         &TemplateParams::positional(["Your order has shipped"]),
//!         options,
//!     )?
//!     .await?;
//!
//! // Replay the token on later sends to skip the token request.
//! let _token = result.new_access_token;
//! # Ok(())
//! # }
//! ```

mod broker;
pub mod client;
pub mod config;
mod context;
pub mod credential;
mod dispatcher;
pub mod errors;
pub mod models;
pub mod payload;
pub mod templates;

pub use client::WnsClient;
pub use config::WnsConfig;
pub use context::SendHandle;
pub use credential::{Credential, CredentialKey};
pub use dispatcher::{status_message, NOTIFICATION_STATUS_HEADER, WNS_TYPE_HEADER};
pub use errors::WnsError;
pub use models::{
    NotificationType, SendOptions, SendResult, ToastAudio, ToastDuration, ToastOptions,
};
pub use payload::{xml_escape, Badge, BadgeState, BadgeValue};
pub use templates::{Template, TemplateParams};
