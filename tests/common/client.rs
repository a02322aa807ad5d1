//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all notification-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::{RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;
use tessera_notification_server::server::session::HEADER_USER_ID;
use tessera_notification_server::server::HEADER_INTERNAL_TOKEN;

/// HTTP test client acting as one proxy-authenticated user
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    user_id: Option<usize>,
}

impl TestClient {
    /// Creates a client that sends no identity header
    ///
    /// Use this for testing the access control of the user endpoints.
    /// For most tests, use `for_user()` instead.
    pub fn anonymous(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            user_id: None,
        }
    }

    /// Creates a client whose requests carry the given identity, the way the
    /// main backend forwards it
    pub fn for_user(base_url: String, user_id: usize) -> Self {
        let mut client = Self::anonymous(base_url);
        client.user_id = Some(user_id);
        client
    }

    fn with_identity(&self, request: RequestBuilder) -> RequestBuilder {
        match self.user_id {
            Some(id) => request.header(HEADER_USER_ID, id.to_string()),
            None => request,
        }
    }

    // ========================================================================
    // Notification endpoints
    // ========================================================================

    /// GET /v1/notifications
    pub async fn list_notifications(&self) -> Response {
        self.with_identity(
            self.client
                .get(format!("{}/v1/notifications", self.base_url)),
        )
        .send()
        .await
        .expect("List notifications request failed")
    }

    /// GET /v1/notifications with explicit paging
    pub async fn list_notifications_page(&self, limit: usize, offset: usize) -> Response {
        self.with_identity(self.client.get(format!(
            "{}/v1/notifications?limit={}&offset={}",
            self.base_url, limit, offset
        )))
        .send()
        .await
        .expect("List notifications request failed")
    }

    /// POST /v1/notifications/mark-read for specific ids
    pub async fn mark_read(&self, notification_ids: &[i64]) -> Response {
        self.mark_read_raw(json!({ "notification_ids": notification_ids }))
            .await
    }

    /// POST /v1/notifications/mark-read for everything unread
    pub async fn mark_all_read(&self) -> Response {
        self.mark_read_raw(json!({ "mark_all": true })).await
    }

    /// POST /v1/notifications/mark-read with an arbitrary body
    pub async fn mark_read_raw(&self, body: Value) -> Response {
        self.with_identity(
            self.client
                .post(format!("{}/v1/notifications/mark-read", self.base_url)),
        )
        .json(&body)
        .send()
        .await
        .expect("Mark read request failed")
    }

    // ========================================================================
    // Device endpoints
    // ========================================================================

    /// POST /v1/devices
    pub async fn register_device(&self, token: &str) -> Response {
        self.register_device_raw(json!({ "token": token })).await
    }

    /// POST /v1/devices with an arbitrary body
    pub async fn register_device_raw(&self, body: Value) -> Response {
        self.with_identity(self.client.post(format!("{}/v1/devices", self.base_url)))
            .json(&body)
            .send()
            .await
            .expect("Register device request failed")
    }

    /// DELETE /v1/devices
    pub async fn unregister_device(&self, token: &str) -> Response {
        self.with_identity(self.client.delete(format!("{}/v1/devices", self.base_url)))
            .json(&json!({ "token": token }))
            .send()
            .await
            .expect("Unregister device request failed")
    }

    /// POST /v1/push/test
    pub async fn send_test_push(&self, body: Value) -> Response {
        self.with_identity(self.client.post(format!("{}/v1/push/test", self.base_url)))
            .json(&body)
            .send()
            .await
            .expect("Test push request failed")
    }

    // ========================================================================
    // Event intake
    // ========================================================================

    /// POST /v1/events with the configured internal token
    pub async fn post_event(&self, event: &Value) -> Response {
        self.post_event_with_token(event, Some(TEST_INTERNAL_TOKEN))
            .await
    }

    /// POST /v1/events with an arbitrary internal token, or none at all
    pub async fn post_event_with_token(&self, event: &Value, token: Option<&str>) -> Response {
        let mut request = self.client.post(format!("{}/v1/events", self.base_url));
        if let Some(token) = token {
            request = request.header(HEADER_INTERNAL_TOKEN, token);
        }
        request
            .json(event)
            .send()
            .await
            .expect("Post event request failed")
    }
}
