use crate::history::store::{RecordSlot, StoreError};
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::Path;
use std::sync::Mutex;

const DB_SCHEMA_VERSION: i64 = 1;

/// Slot key holding the serialized link history.
pub const HISTORY_SLOT: &str = "urlHistory";

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS slots (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT 0
        );
        ",
    )
}

pub fn get_db_connection(data_dir: &Path) -> Result<Connection> {
    let conn = Connection::open(data_dir.join("state.db"))?;
    initialize_schema(&conn)?;
    Ok(conn)
}

pub fn read_slot(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM slots WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn write_slot(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    conn.execute(
        "
        INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        ",
        params![key, value, now],
    )?;
    Ok(())
}

/// A [`RecordSlot`] stored as one row of the local SQLite database.
pub struct SqliteSlot {
    conn: Mutex<Connection>,
    key: String,
}

impl SqliteSlot {
    pub fn new(conn: Connection, key: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(conn),
            key: key.into(),
        }
    }

    pub fn open(data_dir: &Path) -> std::result::Result<Self, StoreError> {
        let conn = get_db_connection(data_dir)?;
        Ok(Self::new(conn, HISTORY_SLOT))
    }
}

impl RecordSlot for SqliteSlot {
    fn read(&self) -> std::result::Result<Option<String>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("slot lock poisoned".to_string()))?;
        Ok(read_slot(&conn, &self.key)?)
    }

    fn write(&self, raw: &str) -> std::result::Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("slot lock poisoned".to_string()))?;
        Ok(write_slot(&conn, &self.key, raw)?)
    }
}
