//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{events, TestClient, TestServer, RECIPIENT_ID, SENDER_ID};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_like_shows_up() {
//!     let server = TestServer::spawn().await;
//!     let backend = TestClient::anonymous(server.base_url.clone());
//!
//!     let response = backend
//!         .post_event(&events::post_liked(SENDER_ID, 100, RECIPIENT_ID))
//!         .await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod gateway;
mod server;

pub mod events;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use gateway::RecordedSend;
#[allow(unused_imports)]
pub use server::TestServer;
