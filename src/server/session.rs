use super::state::ServerState;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::IntoResponse,
};
use tracing::debug;

/// Identity of the caller, forwarded by the main backend. The notification
/// server never authenticates end users itself.
#[derive(Debug)]
pub struct Session {
    pub user_id: usize,
}

pub const HEADER_USER_ID: &str = "x-user-id";

pub enum SessionExtractionError {
    AccessDenied,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::AccessDenied => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

fn extract_session_from_request_parts(parts: &Parts) -> Option<Session> {
    let raw = match parts.headers.get(HEADER_USER_ID) {
        None => {
            debug!("No {} header on request.", HEADER_USER_ID);
            return None;
        }
        Some(x) => x,
    };

    let user_id = match raw.to_str().ok().map(str::trim).map(str::parse::<usize>) {
        Some(Ok(id)) => id,
        _ => {
            debug!("Unparseable {} header.", HEADER_USER_ID);
            return None;
        }
    };

    Some(Session { user_id })
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        _ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts)
            .ok_or(SessionExtractionError::AccessDenied)
    }
}
