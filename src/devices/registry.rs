//! Device registration and token hygiene.
//!
//! Every registration and every fan-out goes through here so that dead relay
//! tokens are removed the moment they are discovered.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::{DeviceEndpoint, TOKEN_MAX_LEN};
use super::DeviceStore;
use crate::push::{DeliveryErrorKind, PushGateway};
use crate::server::metrics::record_tokens_pruned;

/// Errors that can occur while registering a device token.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Token is required")]
    MissingToken,

    #[error("Token is malformed")]
    MalformedToken,

    #[error("Push relay rejected the token: {0}")]
    RejectedToken(DeliveryErrorKind),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct DeviceRegistry {
    store: Arc<dyn DeviceStore>,
    gateway: Arc<dyn PushGateway>,
}

impl DeviceRegistry {
    pub fn new(store: Arc<dyn DeviceStore>, gateway: Arc<dyn PushGateway>) -> Self {
        Self { store, gateway }
    }

    /// Registers a token for a user after probing it against the relay.
    ///
    /// A token already registered to another user is reassigned, the device
    /// moved with whoever logged in on it last. A transient probe failure does
    /// not block registration, only proof that the token is dead does.
    pub async fn register(
        &self,
        user_id: usize,
        raw_token: &str,
    ) -> Result<DeviceEndpoint, RegistrationError> {
        let token = sanitize_token(raw_token)?;

        self.prune_invalid(user_id).await?;

        let probe = self.gateway.send_dry_run(&token).await;
        if let Some(kind) = probe.error {
            if kind.is_terminal() {
                debug!("Rejecting registration of dead token for user {}", user_id);
                return Err(RegistrationError::RejectedToken(kind));
            }
            warn!(
                "Token probe failed transiently ({}), registering for user {} anyway",
                kind, user_id
            );
        }

        let endpoint = self.store.upsert(user_id, &token)?;
        info!("Registered device token for user {}", user_id);
        Ok(endpoint)
    }

    /// Removes a token, but only when it belongs to the given user.
    pub fn unregister(&self, user_id: usize, raw_token: &str) -> Result<bool> {
        self.store.remove(user_id, raw_token.trim())
    }

    pub fn endpoints_for(&self, user_id: usize) -> Result<Vec<DeviceEndpoint>> {
        self.store.endpoints_for(user_id)
    }

    /// Probes every token of a user and removes the ones the relay reports as
    /// dead. Returns how many tokens were removed.
    pub async fn prune_invalid(&self, user_id: usize) -> Result<usize> {
        let mut pruned = 0;
        for endpoint in self.store.endpoints_for(user_id)? {
            let probe = self.gateway.send_dry_run(&endpoint.token).await;
            match probe.error {
                Some(kind) if kind.is_terminal() => {
                    if self.store.remove_token(&endpoint.token)? {
                        info!(
                            "Pruned dead token for user {} after probe ({})",
                            user_id, kind
                        );
                        record_tokens_pruned("probe", 1);
                        pruned += 1;
                    }
                }
                Some(kind) => {
                    debug!(
                        "Token probe for user {} failed transiently ({}), keeping token",
                        user_id, kind
                    );
                }
                None => {}
            }
        }
        Ok(pruned)
    }

    /// Removes a token reported dead during delivery, whoever owns it by now.
    pub fn remove_dead_token(&self, token: &str) -> Result<bool> {
        let removed = self.store.remove_token(token)?;
        if removed {
            record_tokens_pruned("delivery", 1);
        }
        Ok(removed)
    }
}

fn sanitize_token(raw: &str) -> Result<String, RegistrationError> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(RegistrationError::MissingToken);
    }
    if token.len() > TOKEN_MAX_LEN || token.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(RegistrationError::MalformedToken);
    }
    Ok(token.to_string())
}
