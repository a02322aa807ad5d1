use super::models::DeviceEndpoint;
use super::schema::DEVICE_VERSIONED_SCHEMAS;
use super::DeviceStore;
use crate::sqlite_persistence::open_database;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub struct SqliteDeviceStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDeviceStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_database(db_path.as_ref(), DEVICE_VERSIONED_SCHEMAS)
            .context("Failed to open devices database")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_endpoint(row: &rusqlite::Row) -> rusqlite::Result<DeviceEndpoint> {
        Ok(DeviceEndpoint {
            token: row.get("token")?,
            user_id: row.get::<_, i64>("user_id")? as usize,
            registered_at: row.get("registered_at")?,
        })
    }
}

impl DeviceStore for SqliteDeviceStore {
    fn upsert(&self, user_id: usize, token: &str) -> Result<DeviceEndpoint> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO device_endpoints (token, user_id, registered_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(token) DO UPDATE SET user_id = ?2, registered_at = ?3",
            params![token, user_id as i64, now],
        )?;
        Ok(DeviceEndpoint {
            token: token.to_string(),
            user_id,
            registered_at: now,
        })
    }

    fn remove(&self, user_id: usize, token: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "DELETE FROM device_endpoints WHERE token = ?1 AND user_id = ?2",
            params![token, user_id as i64],
        )?;
        Ok(affected > 0)
    }

    fn remove_token(&self, token: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "DELETE FROM device_endpoints WHERE token = ?1",
            params![token],
        )?;
        Ok(affected > 0)
    }

    fn endpoints_for(&self, user_id: usize) -> Result<Vec<DeviceEndpoint>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT token, user_id, registered_at FROM device_endpoints
             WHERE user_id = ?1 ORDER BY registered_at, token",
        )?;
        let endpoints = stmt
            .query_map(params![user_id as i64], Self::row_to_endpoint)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(endpoints)
    }

    fn owner_of(&self, token: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        let owner = conn
            .query_row(
                "SELECT user_id FROM device_endpoints WHERE token = ?1",
                params![token],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(owner.map(|id| id as usize))
    }
}
