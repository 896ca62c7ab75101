// Preference store backed by SQLite

use crate::dates::now_ms;
use eyre::{Context, Result, eyre};
use rusqlite::{Connection, OptionalExtension};
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Namespace a preference entry lives in
///
/// Booleans are kept apart from objects so they can be cleared as a group
/// without touching objects saved under the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Object,
    Bool,
}

impl Slot {
    fn as_str(self) -> &'static str {
        match self {
            Slot::Object => "object",
            Slot::Bool => "bool",
        }
    }
}

/// Persistent string-keyed store for objects and booleans
pub struct Preferences {
    path: PathBuf,
    db: Connection,
}

impl Preferences {
    /// Open or create the preference database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create preferences directory")?;
        }

        let db = Connection::open(&path).context("Failed to open preferences database")?;
        db.busy_timeout(BUSY_TIMEOUT)?;
        let journal_mode: String = db
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .context("Failed to enable WAL journaling")?;
        debug!(journal_mode = %journal_mode, "Preferences journal mode");

        let store = Self { path, db };
        store.create_schema()?;

        debug!(path = ?store.path, "Opened preferences");
        Ok(store)
    }

    /// Path of the backing database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating preferences schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (namespace, key)
            );
            "#,
        )?;

        Ok(())
    }

    // ========================================================================
    // Objects
    // ========================================================================

    /// Save `value` under `key`, replacing any previous object
    pub fn set_object<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value_json = serde_json::to_string(value).context("Failed to serialize preference value")?;
        self.put(Slot::Object, key, &value_json)
    }

    /// Object saved under `key`, or `None` if there is none
    pub fn object<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.fetch(Slot::Object, key)? {
            Some(json) => {
                let value = serde_json::from_str(&json)
                    .with_context(|| format!("Failed to decode preference value for key {:?}", key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Remove the object saved under `key`; returns whether one existed
    pub fn remove_object(&self, key: &str) -> Result<bool> {
        Self::validate_key(key)?;
        let removed = self.db.execute(
            "DELETE FROM preferences WHERE namespace = ?1 AND key = ?2",
            rusqlite::params![Slot::Object.as_str(), key],
        )?;
        Ok(removed > 0)
    }

    /// Keys of all saved objects, sorted
    pub fn object_keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .db
            .prepare("SELECT key FROM preferences WHERE namespace = ?1 ORDER BY key")?;
        let rows = stmt.query_map([Slot::Object.as_str()], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    // ========================================================================
    // Booleans
    // ========================================================================

    /// Save a boolean under `key`
    pub fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.put(Slot::Bool, key, if value { "true" } else { "false" })
    }

    /// Boolean saved under `key`; `false` if unset
    pub fn bool(&self, key: &str) -> Result<bool> {
        match self.fetch(Slot::Bool, key)? {
            Some(json) => serde_json::from_str(&json)
                .with_context(|| format!("Failed to decode boolean preference for key {:?}", key)),
            None => Ok(false),
        }
    }

    /// Remove every boolean entry; objects are untouched
    ///
    /// Returns the number of entries removed.
    pub fn clear_bools(&self) -> Result<usize> {
        let removed = self.db.execute(
            "DELETE FROM preferences WHERE namespace = ?1",
            [Slot::Bool.as_str()],
        )?;
        info!(removed, "Cleared boolean preferences");
        Ok(removed)
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn put(&self, slot: Slot, key: &str, value_json: &str) -> Result<()> {
        Self::validate_key(key)?;
        debug!(namespace = slot.as_str(), key, "Saving preference");

        self.db
            .execute(
                "INSERT OR REPLACE INTO preferences (namespace, key, value_json, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![slot.as_str(), key, value_json, now_ms()],
            )
            .context("Failed to write preference")?;

        Ok(())
    }

    fn fetch(&self, slot: Slot, key: &str) -> Result<Option<String>> {
        Self::validate_key(key)?;

        let json = self
            .db
            .query_row(
                "SELECT value_json FROM preferences WHERE namespace = ?1 AND key = ?2",
                rusqlite::params![slot.as_str(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(json)
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(eyre!("Preference key cannot be empty or whitespace-only"));
        }
        Ok(())
    }
}
