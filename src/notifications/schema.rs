//! SQLite schema definitions for the notifications database.

use crate::sqlite_column;
use crate::sqlite_persistence::{SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

// =============================================================================
// Version 1 - Notifications
// =============================================================================

/// Notifications table - one row per delivered in-app notification
const NOTIFICATIONS_TABLE_V1: Table = Table {
    name: "notifications",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("recipient_id", SqlType::Integer, non_null = true),
        sqlite_column!("sender_id", SqlType::Integer, non_null = true),
        sqlite_column!("kind", SqlType::Text, non_null = true),
        sqlite_column!("post_id", SqlType::Integer),
        sqlite_column!("comment_id", SqlType::Integer),
        sqlite_column!("message", SqlType::Text, non_null = true),
        sqlite_column!(
            "is_read",
            SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created_at",
            SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        (
            "idx_notifications_recipient_created",
            "recipient_id, created_at DESC",
        ),
        (
            "idx_notifications_dedup",
            "recipient_id, sender_id, kind, post_id, comment_id, created_at",
        ),
        ("idx_notifications_recipient_unread", "recipient_id, is_read"),
    ],
};

pub const NOTIFICATION_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[NOTIFICATIONS_TABLE_V1],
    migration: None,
}];
