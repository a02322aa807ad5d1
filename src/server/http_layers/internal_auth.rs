//! Shared-secret gate for the event intake route.

use super::super::state::ServerState;
use axum::extract::State;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

pub const HEADER_INTERNAL_TOKEN: &str = "x-internal-token";

/// Only the main backend may post domain events. It proves itself with a
/// shared secret header, checked before the body is ever parsed.
pub async fn require_internal_token(
    State(state): State<ServerState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let expected = state.config.internal_event_token.as_str();
    let presented = request
        .headers()
        .get(HEADER_INTERNAL_TOKEN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if expected.is_empty() || presented != expected {
        debug!("Rejecting event intake request without a valid internal token.");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    next.run(request).await
}
