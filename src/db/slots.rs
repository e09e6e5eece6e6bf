use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use super::connection::{ensure_schema, open_database};

/// Failure reported by a slot backend.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A named, durable key-value location. Each collection owns exactly one key
/// and always reads or writes its whole list in one call.
pub trait SlotStore {
    /// Return the stored text, or `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, SlotError>;
    /// Replace the stored text for `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), SlotError>;
}

/// SQLite-backed slots: one row per key in the `slots` table.
pub struct SqliteSlots {
    conn: Connection,
}

impl SqliteSlots {
    /// Open (or create) the slot database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_database(path)?;
        Ok(Self { conn })
    }

    /// Private in-memory database, handy for tests.
    pub fn in_memory() -> Result<Self, SlotError> {
        let conn = Connection::open_in_memory()?;
        ensure_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl SlotStore for SqliteSlots {
    fn get(&self, key: &str) -> Result<Option<String>, SlotError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SlotError> {
        self.conn.execute(
            "INSERT INTO slots (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// In-process slots with switchable failures. Tests use it to simulate a
/// broken disk without touching SQLite.
#[derive(Default)]
pub struct MemorySlots {
    values: RefCell<HashMap<String, String>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a slot with raw text, bypassing any store.
    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Raw text currently stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl SlotStore for MemorySlots {
    fn get(&self, key: &str) -> Result<Option<String>, SlotError> {
        if self.fail_reads.get() {
            return Err(SlotError::Unavailable(format!("read of {key} refused")));
        }
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SlotError> {
        if self.fail_writes.get() {
            return Err(SlotError::Unavailable(format!("write of {key} refused")));
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_get_missing_key_is_none() {
        let slots = SqliteSlots::in_memory().unwrap();
        assert_eq!(slots.get("@app_generos").unwrap(), None);
    }

    #[test]
    fn sqlite_set_overwrites_previous_value() {
        let slots = SqliteSlots::in_memory().unwrap();
        slots.set("@app_fatos", "[]").unwrap();
        slots.set("@app_fatos", r#"[{"id":"1"}]"#).unwrap();
        assert_eq!(
            slots.get("@app_fatos").unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );
    }

    #[test]
    fn memory_slots_honour_failure_switches() {
        let slots = MemorySlots::new().with_value("k", "v");
        slots.fail_reads(true);
        assert!(matches!(slots.get("k"), Err(SlotError::Unavailable(_))));
        slots.fail_reads(false);
        assert_eq!(slots.get("k").unwrap().as_deref(), Some("v"));

        slots.fail_writes(true);
        assert!(slots.set("k", "w").is_err());
        assert_eq!(slots.raw("k").as_deref(), Some("v"));
    }
}
