//! In-app notifications and their SQLite persistence

mod models;
mod schema;
mod sqlite_notification_store;

pub use models::{MarkReadSelection, NewNotification, NotificationKind, NotificationRecord};
pub use schema::NOTIFICATION_VERSIONED_SCHEMAS;
pub use sqlite_notification_store::SqliteNotificationStore;

use anyhow::Result;

/// Hard cap on the page size served to clients.
pub const MAX_PAGE_SIZE: usize = 50;

pub trait NotificationStore: Send + Sync {
    /// Inserts the candidate unless an identical one (same recipient, sender,
    /// kind and subject) was created within the dedup window, in which case
    /// the existing row is returned. The bool is true when a row was inserted.
    fn insert_or_dedup(
        &self,
        candidate: &NewNotification,
        dedup_window_sec: i64,
    ) -> Result<(NotificationRecord, bool)>;

    /// Notifications for a recipient, newest first. The limit is clamped to
    /// [MAX_PAGE_SIZE].
    fn list_for_recipient(
        &self,
        user_id: usize,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<NotificationRecord>>;

    fn unread_count(&self, user_id: usize) -> Result<usize>;

    /// Returns the number of rows that changed from unread to read. Rows that
    /// are already read, unknown or owned by another user are skipped.
    fn mark_read(&self, user_id: usize, selection: MarkReadSelection<'_>) -> Result<usize>;
}
