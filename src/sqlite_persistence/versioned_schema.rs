use anyhow::{bail, Result};
use rusqlite::{params, Connection};

/// Epoch seconds at row insertion time, usable as a column default.
pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

/// Offset added to schema versions before stamping PRAGMA user_version, so a
/// database created by anything else (user_version 0) is never mistaken for ours.
pub const BASE_DB_VERSION: usize = 99999;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // unused_mut fires when no optional field assignments are passed
            #[allow(unused_mut)]
            let mut column = $crate::sqlite_persistence::Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
    Blob,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "TEXT" => Some(SqlType::Text),
            "INTEGER" => Some(SqlType::Integer),
            "REAL" => Some(SqlType::Real),
            "BLOB" => Some(SqlType::Blob),
            _ => None,
        }
    }
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub default_value: Option<&'static str>,
}

/// A column as reported by PRAGMA table_info, for comparison against the
/// declared schema.
struct LiveColumn {
    name: String,
    sql_type: SqlType,
    non_null: bool,
    default_value: Option<String>,
    is_primary_key: bool,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// (index name, comma separated column list)
    pub indices: &'static [(&'static str, &'static str)],
}

impl Table {
    fn create_sql(&self) -> String {
        let column_defs: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let mut def = format!("{} {}", column.name, column.sql_type.as_sql());
                if column.is_primary_key {
                    def.push_str(" PRIMARY KEY");
                }
                if column.non_null {
                    def.push_str(" NOT NULL");
                }
                if let Some(default_value) = column.default_value {
                    def.push_str(" DEFAULT ");
                    def.push_str(default_value);
                }
                def
            })
            .collect();
        format!("CREATE TABLE {} ({});", self.name, column_defs.join(", "))
    }

    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute(&self.create_sql(), params![])?;
        for (index_name, column_list) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_list
                ),
                params![],
            )?;
        }
        Ok(())
    }

    fn read_live_columns(&self, conn: &Connection) -> Result<Vec<LiveColumn>> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let mut live_columns = Vec::new();
        let mut rows = stmt.query(params![])?;
        while let Some(row) = rows.next()? {
            let name = row.get::<_, String>(1)?;
            let type_name = row.get::<_, String>(2)?;
            let Some(sql_type) = SqlType::parse(&type_name) else {
                bail!(
                    "Table {} column {} has unsupported type {}",
                    self.name,
                    name,
                    type_name
                );
            };
            live_columns.push(LiveColumn {
                name,
                sql_type,
                non_null: row.get::<_, i32>(3)? == 1,
                default_value: row.get::<_, Option<String>>(4)?,
                is_primary_key: row.get::<_, i32>(5)? == 1,
            });
        }
        Ok(live_columns)
    }

    fn validate_columns(&self, conn: &Connection) -> Result<()> {
        let live_columns = self.read_live_columns(conn)?;
        if live_columns.len() != self.columns.len() {
            bail!(
                "Table {} has columns [{}], expected [{}]",
                self.name,
                live_columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        for (live, expected) in live_columns.iter().zip(self.columns.iter()) {
            self.validate_column(live, expected)?;
        }
        Ok(())
    }

    fn validate_column(&self, live: &LiveColumn, expected: &Column) -> Result<()> {
        if live.name != expected.name {
            bail!(
                "Table {} column name mismatch: expected {}, got {}",
                self.name,
                expected.name,
                live.name
            );
        }
        if live.sql_type != expected.sql_type {
            bail!(
                "Table {} column {} type mismatch: expected {:?}, got {:?}",
                self.name,
                expected.name,
                expected.sql_type,
                live.sql_type
            );
        }
        if live.non_null != expected.non_null {
            bail!(
                "Table {} column {} non-null mismatch: expected {}, got {}",
                self.name,
                expected.name,
                expected.non_null,
                live.non_null
            );
        }
        // SQLite may report defaults wrapped in parentheses
        let live_default = live.default_value.as_deref().map(normalize_default);
        let expected_default = expected.default_value.map(normalize_default);
        if live_default != expected_default {
            bail!(
                "Table {} column {} default mismatch: expected {:?}, got {:?}",
                self.name,
                expected.name,
                expected.default_value,
                live.default_value
            );
        }
        if live.is_primary_key != expected.is_primary_key {
            bail!(
                "Table {} column {} primary key mismatch: expected {}, got {}",
                self.name,
                expected.name,
                expected.is_primary_key,
                live.is_primary_key
            );
        }
        Ok(())
    }

    fn validate_indices(&self, conn: &Connection) -> Result<()> {
        for (index_name, _) in self.indices {
            let exists: bool = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, self.name],
                    |_| Ok(true),
                )
                .unwrap_or(false);
            if !exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }
        Ok(())
    }
}

fn normalize_default(s: &str) -> String {
    if s.starts_with('(') && s.ends_with(')') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate_columns(conn)?;
            table.validate_indices(conn)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TABLE: Table = Table {
        name: "widgets",
        columns: &[
            sqlite_column!("id", SqlType::Integer, is_primary_key = true),
            sqlite_column!("label", SqlType::Text, non_null = true),
            sqlite_column!("weight", SqlType::Real),
            sqlite_column!(
                "created_at",
                SqlType::Integer,
                non_null = true,
                default_value = Some(DEFAULT_TIMESTAMP)
            ),
        ],
        indices: &[("idx_widgets_label", "label")],
    };

    const TEST_SCHEMA: VersionedSchema = VersionedSchema {
        version: 1,
        tables: &[TEST_TABLE],
        migration: None,
    };

    #[test]
    fn test_create_sql() {
        assert_eq!(
            TEST_TABLE.create_sql(),
            "CREATE TABLE widgets (id INTEGER PRIMARY KEY, label TEXT NOT NULL, \
             weight REAL, created_at INTEGER NOT NULL DEFAULT \
             (cast(strftime('%s','now') as int)));"
        );
    }

    #[test]
    fn test_create_then_validate() {
        let conn = Connection::open_in_memory().unwrap();
        TEST_SCHEMA.create(&conn).unwrap();
        TEST_SCHEMA.validate(&conn).unwrap();

        let stamped: i64 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stamped as usize, BASE_DB_VERSION + 1);
    }

    #[test]
    fn test_validate_detects_missing_index() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE widgets (id INTEGER PRIMARY KEY, label TEXT NOT NULL, \
             weight REAL, created_at INTEGER NOT NULL DEFAULT \
             (cast(strftime('%s','now') as int)));",
            [],
        )
        .unwrap();

        let err = TEST_SCHEMA.validate(&conn).unwrap_err();
        assert!(err.to_string().contains("missing index"));
    }

    #[test]
    fn test_validate_detects_type_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE widgets (id INTEGER PRIMARY KEY, label INTEGER NOT NULL, \
             weight REAL, created_at INTEGER NOT NULL DEFAULT \
             (cast(strftime('%s','now') as int)));",
            [],
        )
        .unwrap();
        conn.execute("CREATE INDEX idx_widgets_label ON widgets(label);", [])
            .unwrap();

        let err = TEST_SCHEMA.validate(&conn).unwrap_err();
        assert!(err.to_string().contains("type mismatch"));
    }

    #[test]
    fn test_validate_detects_missing_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE widgets (id INTEGER PRIMARY KEY, label TEXT NOT NULL);",
            [],
        )
        .unwrap();
        conn.execute("CREATE INDEX idx_widgets_label ON widgets(label);", [])
            .unwrap();

        assert!(TEST_SCHEMA.validate(&conn).is_err());
    }

    #[test]
    fn test_normalize_default_strips_outer_parentheses() {
        assert_eq!(normalize_default("(0)"), "0");
        assert_eq!(normalize_default("0"), "0");
        assert_eq!(
            normalize_default(DEFAULT_TIMESTAMP),
            "cast(strftime('%s','now') as int)"
        );
    }
}
