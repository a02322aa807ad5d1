use async_trait::async_trait;
use tracing::info;

use super::models::{DeliveryOutcome, PushMessage};

/// Client-side seam to the push relay.
///
/// Implementations classify failures themselves, a delivery attempt always
/// produces an outcome rather than an error.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Deliver a message to a single device token.
    async fn send(&self, token: &str, message: &PushMessage) -> DeliveryOutcome;

    /// Validate a token against the relay without delivering anything.
    async fn send_dry_run(&self, token: &str) -> DeliveryOutcome;
}

/// Gateway that accepts everything and delivers nothing, for running without
/// a push relay.
pub struct NoopPushGateway;

#[async_trait]
impl PushGateway for NoopPushGateway {
    async fn send(&self, token: &str, message: &PushMessage) -> DeliveryOutcome {
        info!(
            "Dry-run push to {}: \"{}\" / \"{}\"",
            token, message.title, message.body
        );
        DeliveryOutcome::delivered(token)
    }

    async fn send_dry_run(&self, token: &str) -> DeliveryOutcome {
        DeliveryOutcome::delivered(token)
    }
}
