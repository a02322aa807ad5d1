//! HTTP client for the external push relay service.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::gateway::PushGateway;
use super::models::{DeliveryErrorKind, DeliveryOutcome, PushMessage};

#[derive(Serialize)]
struct SendRequest<'a> {
    token: &'a str,
    title: &'a str,
    body: &'a str,
    data: &'a HashMap<String, String>,
    dry_run: bool,
}

#[derive(Deserialize)]
struct SendErrorBody {
    error: String,
}

/// HTTP client for communicating with the push relay service.
pub struct HttpPushGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPushGateway {
    /// Create a new push relay client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the push relay (e.g., "http://localhost:8090")
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: String, timeout_sec: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .expect("Failed to create HTTP client");

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_send(&self, token: &str, message: &PushMessage, dry_run: bool) -> DeliveryOutcome {
        let url = format!("{}/v1/send", self.base_url);
        let request = SendRequest {
            token,
            title: &message.title,
            body: &message.body,
            data: &message.data,
            dry_run,
        };
        let response = match self.client.post(&url).json(&request).send().await {
            Ok(response) => response,
            Err(err) => {
                // a timeout or connection failure proves nothing about the token
                debug!("Push relay request failed: {}", err);
                return DeliveryOutcome::failed(token, DeliveryErrorKind::Transient);
            }
        };

        let status = response.status();
        if status.is_success() {
            return DeliveryOutcome::delivered(token);
        }

        let kind = match response.json::<SendErrorBody>().await {
            Ok(body) => {
                classify_error_code(&body.error).unwrap_or_else(|| classify_status(status))
            }
            Err(_) => classify_status(status),
        };
        debug!("Push relay rejected delivery: status {}, {}", status, kind);
        DeliveryOutcome::failed(token, kind)
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn send(&self, token: &str, message: &PushMessage) -> DeliveryOutcome {
        self.post_send(token, message, false).await
    }

    async fn send_dry_run(&self, token: &str) -> DeliveryOutcome {
        let probe = PushMessage {
            title: String::new(),
            body: String::new(),
            data: HashMap::new(),
        };
        self.post_send(token, &probe, true).await
    }
}

/// Maps a structured relay error code to a delivery error kind.
fn classify_error_code(code: &str) -> Option<DeliveryErrorKind> {
    match code {
        "token_not_registered" | "unregistered" => Some(DeliveryErrorKind::TokenNotRegistered),
        "sender_mismatch" => Some(DeliveryErrorKind::SenderMismatch),
        "unavailable" | "rate_limited" => Some(DeliveryErrorKind::Transient),
        _ => None,
    }
}

/// Fallback classification when the relay response carries no usable body.
fn classify_status(status: StatusCode) -> DeliveryErrorKind {
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        DeliveryErrorKind::TokenNotRegistered
    } else if status == StatusCode::FORBIDDEN {
        DeliveryErrorKind::SenderMismatch
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        DeliveryErrorKind::Transient
    } else {
        DeliveryErrorKind::Unknown
    }
}
