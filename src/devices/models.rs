//! Device endpoint data models

use serde::{Deserialize, Serialize};

// Validation constants
pub const TOKEN_MAX_LEN: usize = 4096;

/// A push-capable device, identified by its relay token.
///
/// The token is the identity, a device re-registering under a new account
/// moves with it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    pub token: String,
    pub user_id: usize,
    pub registered_at: i64,
}
