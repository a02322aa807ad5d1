use super::models::{MarkReadSelection, NewNotification, NotificationKind, NotificationRecord};
use super::schema::NOTIFICATION_VERSIONED_SCHEMAS;
use super::{NotificationStore, MAX_PAGE_SIZE};
use crate::sqlite_persistence::open_database;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub struct SqliteNotificationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteNotificationStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_database(db_path.as_ref(), NOTIFICATION_VERSIONED_SCHEMAS)
            .context("Failed to open notifications database")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<NotificationRecord> {
        let kind_str: String = row.get("kind")?;
        let kind = NotificationKind::parse(&kind_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown notification kind '{}'", kind_str).into(),
            )
        })?;
        Ok(NotificationRecord {
            id: row.get("id")?,
            recipient_id: row.get::<_, i64>("recipient_id")? as usize,
            sender_id: row.get::<_, i64>("sender_id")? as usize,
            kind,
            post_id: row.get("post_id")?,
            comment_id: row.get("comment_id")?,
            message: row.get("message")?,
            is_read: row.get::<_, i64>("is_read")? != 0,
            created_at: row.get("created_at")?,
        })
    }
}

impl NotificationStore for SqliteNotificationStore {
    fn insert_or_dedup(
        &self,
        candidate: &NewNotification,
        dedup_window_sec: i64,
    ) -> Result<(NotificationRecord, bool)> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let now = Utc::now().timestamp();

        // NULL subject ids must compare equal, hence IS instead of =
        let existing = tx
            .query_row(
                "SELECT id, recipient_id, sender_id, kind, post_id, comment_id, message, is_read, created_at \
                 FROM notifications \
                 WHERE recipient_id = ?1 AND sender_id = ?2 AND kind = ?3 \
                   AND post_id IS ?4 AND comment_id IS ?5 AND created_at > ?6 \
                 ORDER BY created_at DESC, id DESC LIMIT 1",
                params![
                    candidate.recipient_id as i64,
                    candidate.sender_id as i64,
                    candidate.kind.as_str(),
                    candidate.post_id,
                    candidate.comment_id,
                    now - dedup_window_sec,
                ],
                Self::row_to_record,
            )
            .optional()?;
        if let Some(record) = existing {
            tx.commit()?;
            return Ok((record, false));
        }

        tx.execute(
            "INSERT INTO notifications \
             (recipient_id, sender_id, kind, post_id, comment_id, message, is_read, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
            params![
                candidate.recipient_id as i64,
                candidate.sender_id as i64,
                candidate.kind.as_str(),
                candidate.post_id,
                candidate.comment_id,
                candidate.message,
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok((
            NotificationRecord {
                id,
                recipient_id: candidate.recipient_id,
                sender_id: candidate.sender_id,
                kind: candidate.kind,
                post_id: candidate.post_id,
                comment_id: candidate.comment_id,
                message: candidate.message.clone(),
                is_read: false,
                created_at: now,
            },
            true,
        ))
    }

    fn list_for_recipient(
        &self,
        user_id: usize,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<NotificationRecord>> {
        let limit = limit.min(MAX_PAGE_SIZE);
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, recipient_id, sender_id, kind, post_id, comment_id, message, is_read, created_at \
             FROM notifications WHERE recipient_id = ?1 \
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
        )?;
        let records = stmt
            .query_map(
                params![user_id as i64, limit as i64, offset as i64],
                Self::row_to_record,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn unread_count(&self, user_id: usize) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND is_read = 0",
            params![user_id as i64],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn mark_read(&self, user_id: usize, selection: MarkReadSelection<'_>) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        match selection {
            MarkReadSelection::All => {
                let affected = conn.execute(
                    "UPDATE notifications SET is_read = 1 WHERE recipient_id = ?1 AND is_read = 0",
                    params![user_id as i64],
                )?;
                Ok(affected)
            }
            MarkReadSelection::Ids(ids) => {
                let tx = conn.transaction()?;
                let mut affected = 0;
                for id in ids {
                    affected += tx.execute(
                        "UPDATE notifications SET is_read = 1 \
                         WHERE id = ?1 AND recipient_id = ?2 AND is_read = 0",
                        params![id, user_id as i64],
                    )?;
                }
                tx.commit()?;
                Ok(affected)
            }
        }
    }
}
