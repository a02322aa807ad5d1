mod versioned_schema;

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, info};

pub use versioned_schema::{
    Column, SqlType, Table, VersionedSchema, BASE_DB_VERSION, DEFAULT_TIMESTAMP,
};

/// Opens a database file, creating it with the latest schema when it does not
/// exist yet, otherwise validating the stamped schema version and running any
/// pending migrations.
pub fn open_database(path: &Path, schemas: &[VersionedSchema]) -> Result<Connection> {
    let latest = schemas
        .last()
        .context("No schema versions defined for database")?;
    let is_new_db = !path.exists();
    let mut conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;

    if is_new_db {
        latest.create(&conn)?;
        debug!(
            "Created database at {} with schema version {}",
            path.display(),
            latest.version
        );
        return Ok(conn);
    }

    let stamped: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let db_version = (stamped as usize)
        .checked_sub(BASE_DB_VERSION)
        .with_context(|| {
            format!(
                "Database at {} has unrecognized version stamp {}",
                path.display(),
                stamped
            )
        })?;
    let schema = schemas
        .iter()
        .find(|schema| schema.version == db_version)
        .with_context(|| {
            format!(
                "Database at {} has unknown schema version {}",
                path.display(),
                db_version
            )
        })?;
    schema.validate(&conn).with_context(|| {
        format!(
            "Database at {} failed validation for schema version {}",
            path.display(),
            db_version
        )
    })?;
    migrate_if_needed(&mut conn, db_version, schemas)?;
    Ok(conn)
}

fn migrate_if_needed(
    conn: &mut Connection,
    from_version: usize,
    schemas: &[VersionedSchema],
) -> Result<()> {
    let latest_version = match schemas.last() {
        Some(schema) if schema.version > from_version => schema.version,
        _ => return Ok(()),
    };
    info!(
        "Migrating database from version {} to {}",
        from_version, latest_version
    );
    let tx = conn.transaction()?;
    for schema in schemas.iter().filter(|s| s.version > from_version) {
        if let Some(migration) = schema.migration {
            migration(&tx).with_context(|| {
                format!("Migration to schema version {} failed", schema.version)
            })?;
        }
        tx.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + schema.version),
            [],
        )?;
    }
    tx.commit()?;
    Ok(())
}
