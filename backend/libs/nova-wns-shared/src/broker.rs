//! Access token broker.
//!
//! Keeps one queue of pending sends per credential while a token request for
//! that credential is in flight. The queue's presence is the in-flight marker:
//! it is created together with the token request and removed, in the same
//! critical section that drains it, when the request completes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use tracing::{debug, info, warn};

use crate::config::WnsConfig;
use crate::context::SendContext;
use crate::credential::{Credential, CredentialKey};
use crate::dispatcher::NotificationDispatcher;
use crate::errors::WnsError;
use crate::models::AccessTokenResponse;

pub(crate) struct TokenBroker {
    http_client: reqwest::Client,
    token_url: String,
    scope: String,
    pending: Mutex<HashMap<CredentialKey, Vec<SendContext>>>,
    dispatcher: NotificationDispatcher,
}

impl TokenBroker {
    pub fn new(http_client: reqwest::Client, config: &WnsConfig) -> Arc<Self> {
        Arc::new_cyclic(|broker| Self {
            http_client: http_client.clone(),
            token_url: config.token_url.clone(),
            scope: config.scope.clone(),
            pending: Mutex::new(HashMap::new()),
            dispatcher: NotificationDispatcher::new(http_client, broker.clone()),
        })
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// Queue `context` until a token for its credential is available.
    ///
    /// Only the first caller for a credential issues the token request;
    /// later callers join its queue.
    pub fn request_token(self: &Arc<Self>, context: SendContext) {
        let key = context.key();
        let credential = context.credential.clone();

        {
            let mut pending = self.pending.lock();
            if let Some(queue) = pending.get_mut(&key) {
                queue.push(context);
                debug!(
                    "Token request for client {} already in flight, {} send(s) queued",
                    credential.client_id,
                    queue.len()
                );
                return;
            }
            pending.insert(key.clone(), vec![context]);
        }

        info!("Requesting WNS access token for client {}", credential.client_id);

        let in_flight = InFlightToken {
            broker: Arc::clone(self),
            key: Some(key),
        };
        tokio::spawn(async move {
            let outcome = in_flight.broker.fetch_token(&credential).await;
            in_flight.release(outcome);
        });
    }

    /// Join an in-flight token request for the context's credential.
    ///
    /// Returns the context back when nothing is in flight.
    pub fn enqueue_if_pending(&self, context: SendContext) -> Option<SendContext> {
        let mut pending = self.pending.lock();
        match pending.get_mut(&context.key()) {
            Some(queue) => {
                debug!(
                    "Token request for client {} in flight, queueing send",
                    context.credential.client_id
                );
                queue.push(context);
                None
            }
            None => Some(context),
        }
    }

    /// Number of credentials with a token request in flight
    pub fn pending_credentials(&self) -> usize {
        self.pending.lock().len()
    }

    /// Tear down the queue for `key` and fan the token outcome out to every
    /// queued send, in arrival order.
    fn release(self: &Arc<Self>, key: &CredentialKey, outcome: Result<String, WnsError>) {
        let queued = self.pending.lock().remove(key).unwrap_or_default();

        match outcome {
            Ok(access_token) => {
                info!(
                    "Obtained WNS access token, releasing {} queued send(s)",
                    queued.len()
                );
                for mut context in queued {
                    context.new_access_token = Some(access_token.clone());
                    let broker = Arc::clone(self);
                    tokio::spawn(async move {
                        broker.dispatcher.dispatch(context).await;
                    });
                }
            }
            Err(e) => {
                warn!(
                    "Failed to obtain WNS access token, failing {} queued send(s): {}",
                    queued.len(),
                    e
                );
                for context in queued {
                    context.complete(Err(e.clone()));
                }
            }
        }
    }

    /// POST the client_credentials grant and validate the response
    async fn fetch_token(&self, credential: &Credential) -> Result<String, WnsError> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| WnsError::TokenTransport(Arc::new(e)))?;

        let status_code = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| WnsError::TokenTransport(Arc::new(e)))?;

        parse_token_response(status_code, headers, body)
    }
}

/// Ties the pending queue for one credential to the task fetching its token.
///
/// If the task is dropped before the request completes (its runtime shut
/// down), the queue is removed and every queued send resolves to
/// [`WnsError::Canceled`].
struct InFlightToken {
    broker: Arc<TokenBroker>,
    key: Option<CredentialKey>,
}

impl InFlightToken {
    fn release(mut self, outcome: Result<String, WnsError>) {
        if let Some(key) = self.key.take() {
            self.broker.release(&key, outcome);
        }
    }
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        let queued = self.broker.pending.lock().remove(&key).unwrap_or_default();
        warn!(
            "WNS token request abandoned, canceling {} queued send(s)",
            queued.len()
        );
        for context in queued {
            context.complete(Err(WnsError::Canceled));
        }
    }
}

fn parse_token_response(
    status_code: u16,
    headers: HeaderMap,
    body: String,
) -> Result<String, WnsError> {
    if status_code != 200 {
        return Err(WnsError::TokenRejected {
            status_code,
            headers,
            body,
        });
    }

    let reason = match serde_json::from_str::<AccessTokenResponse>(&body) {
        Ok(token) if token.token_type == "bearer" => return Ok(token.access_token),
        Ok(token) => format!("unexpected token_type {}", token.token_type),
        Err(e) => e.to_string(),
    };

    Err(WnsError::TokenInvalidResponse {
        status_code,
        headers,
        body,
        reason,
    })
}
