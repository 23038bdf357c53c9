//! SQLite-backed key-value store.
//!
//! The application state is one JSON document under [`STATE_KEY`]; the
//! table layout never needs to change when the document grows.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection};

use super::{data_dir, StateStore};
use crate::error::{CoreError, StoreError};
use crate::state::AppState;

/// Key of the application state document.
pub const STATE_KEY: &str = "app_state";

/// Prefix of keys holding copies of state documents that failed to decode.
pub const UNREADABLE_PREFIX: &str = "app_state.unreadable.";

/// SQLite database holding the persisted key-value pairs.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/distill/distill.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("distill.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Keys holding copies of unreadable state documents, oldest first.
    pub fn unreadable_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv WHERE key LIKE ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![format!("{UNREADABLE_PREFIX}%")], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Store `raw` under a fresh backup key unless an identical copy exists.
    fn keep_unreadable(&self, raw: &str) -> Result<String, StoreError> {
        let existing = self.conn.query_row(
            "SELECT key FROM kv WHERE key LIKE ?1 AND value = ?2",
            params![format!("{UNREADABLE_PREFIX}%"), raw],
            |row| row.get::<_, String>(0),
        );
        match existing {
            Ok(key) => Ok(key),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                let key = format!("{UNREADABLE_PREFIX}{}", Utc::now().timestamp_millis());
                self.kv_set(&key, raw)?;
                Ok(key)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl StateStore for Database {
    /// A missing document is an empty state. A document that is not a JSON
    /// object at all is copied under an [`UNREADABLE_PREFIX`] key and then
    /// treated as empty, so a corrupt write never locks the user out and the
    /// next save cannot destroy it.
    fn load(&self) -> Result<AppState, StoreError> {
        let Some(raw) = self.kv_get(STATE_KEY)? else {
            return Ok(AppState::default());
        };
        match serde_json::from_str(&raw) {
            Ok(state) => Ok(state),
            Err(e) => {
                let backup = self.keep_unreadable(&raw)?;
                tracing::warn!(error = %e, %backup, "stored state unreadable, starting empty");
                Ok(AppState::default())
            }
        }
    }

    fn save(&self, state: &AppState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state)?;
        self.kv_set(STATE_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use chrono::NaiveDate;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn empty_database_loads_default_state() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.load().unwrap(), AppState::default());
    }

    #[test]
    fn state_survives_save_and_load() {
        let db = Database::open_memory().unwrap();
        let mut state = AppState::default();
        state.add_task(NewTask::new("Water plants"), Utc::now()).unwrap();
        db.save(&state).unwrap();
        assert_eq!(db.load().unwrap(), state);
    }

    #[test]
    fn corrupt_document_loads_empty() {
        let db = Database::open_memory().unwrap();
        db.kv_set(STATE_KEY, "{not json").unwrap();
        assert_eq!(db.load().unwrap(), AppState::default());
    }

    #[test]
    fn corrupt_document_is_kept_before_being_replaced() {
        let db = Database::open_memory().unwrap();
        db.kv_set(STATE_KEY, "{not json").unwrap();

        db.update(|s| s.set_date(NaiveDate::from_ymd_opt(2026, 5, 11).unwrap()))
            .unwrap();
        db.load().unwrap();

        let keys = db.unreadable_keys().unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(db.kv_get(&keys[0]).unwrap().as_deref(), Some("{not json"));
        assert!(db.load().unwrap().date.is_some());
    }

    #[test]
    fn bad_settings_do_not_drop_tasks() {
        let db = Database::open_memory().unwrap();
        let raw = r#"{
            "tasks": [{"id": "a", "title": "Keep me", "createdAt": "2026-05-01T08:00:00Z"}],
            "timeDuration": "thirty",
            "autoStartTimer": "yes"
        }"#;
        db.kv_set(STATE_KEY, raw).unwrap();

        let state = db.load().unwrap();
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.settings.time_duration, 25);
        assert!(!state.settings.auto_start_timer);
        assert!(db.unreadable_keys().unwrap().is_empty());
    }
}
