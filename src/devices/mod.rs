//! Push device endpoints and their SQLite persistence

mod models;
mod registry;
mod schema;
mod sqlite_device_store;

pub use models::{DeviceEndpoint, TOKEN_MAX_LEN};
pub use registry::{DeviceRegistry, RegistrationError};
pub use schema::DEVICE_VERSIONED_SCHEMAS;
pub use sqlite_device_store::SqliteDeviceStore;

use anyhow::Result;

pub trait DeviceStore: Send + Sync {
    /// Inserts the token for the user, taking it over from any previous owner.
    fn upsert(&self, user_id: usize, token: &str) -> Result<DeviceEndpoint>;

    /// Deletes the token only when it belongs to the user. Returns whether a
    /// row was deleted.
    fn remove(&self, user_id: usize, token: &str) -> Result<bool>;

    /// Deletes the token regardless of who owns it by now.
    fn remove_token(&self, token: &str) -> Result<bool>;

    fn endpoints_for(&self, user_id: usize) -> Result<Vec<DeviceEndpoint>>;

    fn owner_of(&self, token: &str) -> Result<Option<usize>>;
}
