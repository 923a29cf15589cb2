use crate::errors::{AppError, AppResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("schema.sql");

pub mod keys {
    pub const FILTERS: &str = "filters";
    pub const TASKS: &str = "tasks";
    pub const NOTES: &str = "notes";
    pub const EVENTS: &str = "events";
    pub const AUDIT: &str = "audit";
    pub const DATA: &str = "data";
    pub const FILTERED: &str = "filtered";
}

/// Durable key/value mirror of the in-memory stores. In-memory state stays
/// authoritative; storage is written through on mutation and read once at
/// startup.
pub trait StateGateway: Send + Sync {
    fn load(&self, key: &str) -> AppResult<Option<serde_json::Value>>;
    fn save(&self, key: &str, value: &serde_json::Value) -> AppResult<()>;
}

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

impl StateGateway for Database {
    fn load(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let raw = conn
            .query_row("SELECT value_json FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;

        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw).ok()),
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, value: &serde_json::Value) -> AppResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO kv (key, value_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
            params![key, serde_json::to_string(value)?, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

/// Seed helper: a missing or corrupt entry falls back to the default for that
/// one store without touching the others.
pub fn load_or_default<T>(gateway: &dyn StateGateway, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match gateway.load(key) {
        Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|error| {
            tracing::warn!(key, error = %error, "stored state is malformed, using default");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(error) => {
            tracing::warn!(key, error = %error, "failed to read stored state, using default");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{load_or_default, Database, StateGateway};
    use serde_json::json;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("state.sqlite")).expect("open db");

        db.save("filters", &json!({"department": "Dyeing"}))
            .expect("save");
        let loaded = db.load("filters").expect("load").expect("present");
        assert_eq!(loaded["department"], "Dyeing");

        db.save("filters", &json!({"department": null})).expect("overwrite");
        let loaded = db.load("filters").expect("load").expect("present");
        assert!(loaded["department"].is_null());
    }

    #[test]
    fn missing_key_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("state.sqlite")).expect("open db");
        assert!(db.load("tasks").expect("load").is_none());
    }

    #[test]
    fn corrupt_entry_falls_back_to_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("state.sqlite")).expect("open db");

        // A shape mismatch, not invalid JSON: a list where a map is expected.
        db.save("notes", &json!(["not", "a", "map"])).expect("save");
        let notes: std::collections::BTreeMap<String, Vec<String>> =
            load_or_default(&db, "notes");
        assert!(notes.is_empty());
    }
}
