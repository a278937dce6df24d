//! Durable backends for the history log.
//!
//! Every backend holds the serialized log in a single named slot and is
//! rewritten wholesale on each mutation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::PersistenceError;
use crate::lock_unpoisoned;

/// Name of the storage slot holding the serialized log.
pub const HISTORY_SLOT: &str = "measurement_history";

/// A single-slot durable store for the serialized history log.
pub trait HistoryStorage: Send + Sync {
    /// Current payload, or `None` if nothing has been written yet.
    fn read(&self) -> Result<Option<String>, PersistenceError>;

    /// Replace the payload.
    fn write(&self, payload: &str) -> Result<(), PersistenceError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

impl<T: HistoryStorage + ?Sized> HistoryStorage for Arc<T> {
    fn read(&self) -> Result<Option<String>, PersistenceError> {
        (**self).read()
    }

    fn write(&self, payload: &str) -> Result<(), PersistenceError> {
        (**self).write(payload)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// History kept in one JSON file, replaced atomically on every write.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/measurement_history.json`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(format!("{}.json", HISTORY_SLOT)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStorage for JsonFileStorage {
    fn read(&self) -> Result<Option<String>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|e| PersistenceError::Read(format!("{:?}: {}", self.path, e)))
    }

    fn write(&self, payload: &str) -> Result<(), PersistenceError> {
        write_atomic(&self.path, payload).map_err(|e| PersistenceError::Write(format!("{:#}", e)))
    }

    fn describe(&self) -> String {
        format!("{:?}", self.path)
    }
}

/// Temp file in the target directory, then rename over the target, so an
/// interrupted write never leaves a truncated log behind.
fn write_atomic(target: &Path, content: &str) -> anyhow::Result<()> {
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create data dir {:?}", parent))?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.flush()?;
    temp.persist(target)
        .with_context(|| format!("Failed to replace {:?}", target))?;
    Ok(())
}

/// History kept as one row of a key/value table in SQLite.
/// rusqlite is blocking; the connection is serialized behind a mutex.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    db_label: String,
}

impl SqliteStorage {
    /// Create or open the database file, ensuring the table exists.
    pub fn open(db_path: &Path) -> Result<Self, PersistenceError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PersistenceError::Read(format!("Failed to create data dir: {}", e)))?;
        }
        let conn = Connection::open(db_path)
            .map_err(|e| PersistenceError::Read(format!("Failed to open history db: {}", e)))?;
        let storage = Self::with_connection(conn, format!("{:?}", db_path))?;
        info!("Opened history database at {:?}", db_path);
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| PersistenceError::Read(format!("Failed to open history db: {}", e)))?;
        Self::with_connection(conn, ":memory:".to_string())
    }

    fn with_connection(conn: Connection, db_label: String) -> Result<Self, PersistenceError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )
        .map_err(|e| PersistenceError::Read(format!("Failed to create table: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_label,
        })
    }
}

impl HistoryStorage for SqliteStorage {
    fn read(&self) -> Result<Option<String>, PersistenceError> {
        let conn = lock_unpoisoned(&self.conn);
        conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![HISTORY_SLOT],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| PersistenceError::Read(format!("Failed to query history: {}", e)))
    }

    fn write(&self, payload: &str) -> Result<(), PersistenceError> {
        let conn = lock_unpoisoned(&self.conn);
        conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))",
            params![HISTORY_SLOT, payload],
        )
        .map_err(|e| PersistenceError::Write(format!("Failed to store history: {}", e)))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite {}#{}", self.db_label, HISTORY_SLOT)
    }
}

/// In-process slot. Nothing survives the process, but the store behaves the
/// same, which makes it useful for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded slot, e.g. to simulate what a previous run left behind.
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(payload.into())),
        }
    }

    pub fn payload(&self) -> Option<String> {
        lock_unpoisoned(&self.slot).clone()
    }
}

impl HistoryStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, PersistenceError> {
        Ok(self.payload())
    }

    fn write(&self, payload: &str) -> Result<(), PersistenceError> {
        *lock_unpoisoned(&self.slot) = Some(payload.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
