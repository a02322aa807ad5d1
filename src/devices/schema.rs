//! SQLite schema definitions for the devices database.

use crate::sqlite_column;
use crate::sqlite_persistence::{SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

// =============================================================================
// Version 1 - Device endpoints
// =============================================================================

/// Device endpoints table - push tokens keyed by the token itself so a token
/// can only ever belong to one user
const DEVICE_ENDPOINTS_TABLE_V1: Table = Table {
    name: "device_endpoints",
    columns: &[
        sqlite_column!("token", SqlType::Text, is_primary_key = true),
        sqlite_column!("user_id", SqlType::Integer, non_null = true),
        sqlite_column!(
            "registered_at",
            SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_device_endpoints_user", "user_id")],
};

pub const DEVICE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[DEVICE_ENDPOINTS_TABLE_V1],
    migration: None,
}];
