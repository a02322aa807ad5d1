mod internal_auth;
mod requests_logging;

pub use internal_auth::{require_internal_token, HEADER_INTERNAL_TOKEN};
pub use requests_logging::{log_requests, RequestsLoggingLevel};
