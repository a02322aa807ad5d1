//! Push delivery data models

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a failed delivery attempt is classified.
///
/// Terminal kinds prove the token is dead and safe to remove. Everything else
/// must never cause token removal, a relay outage is not evidence against a
/// token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryErrorKind {
    /// The push service no longer knows the token.
    TokenNotRegistered,
    /// The token belongs to a different push project.
    SenderMismatch,
    /// Timeout, connection failure, throttling or a relay-side outage.
    Transient,
    /// Anything the relay reported that fits no other bucket.
    Unknown,
}

impl DeliveryErrorKind {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliveryErrorKind::TokenNotRegistered | DeliveryErrorKind::SenderMismatch
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryErrorKind::TokenNotRegistered => "token_not_registered",
            DeliveryErrorKind::SenderMismatch => "sender_mismatch",
            DeliveryErrorKind::Transient => "transient",
            DeliveryErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DeliveryErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one delivery attempt against one device token.
#[derive(Clone, Debug, Serialize)]
pub struct DeliveryOutcome {
    pub token: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DeliveryErrorKind>,
}

impl DeliveryOutcome {
    pub fn delivered(token: &str) -> Self {
        Self {
            token: token.to_string(),
            success: true,
            error: None,
        }
    }

    pub fn failed(token: &str, kind: DeliveryErrorKind) -> Self {
        Self {
            token: token.to_string(),
            success: false,
            error: Some(kind),
        }
    }
}

/// A rendered push notification, ready for delivery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    /// String-valued payload handed to the client app, e.g. ids for deep links.
    pub data: HashMap<String, String>,
}
