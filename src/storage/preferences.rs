// SPDX-License-Identifier: Apache-2.0

//! Local key-value preferences
//!
//! Key scheme:
//! - `table-widths/{connection}/{schema}/{table}`: saved grid column widths
//! - `sql-studio-history`: recent SQL, newest first
//! - `saved-charts`, `dashboards`: chart builder state

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use vitalake_core::{EngineError, EngineResult};

use crate::grid::SavedWidths;

pub const HISTORY_KEY: &str = "sql-studio-history";
pub const SAVED_CHARTS_KEY: &str = "saved-charts";
pub const DASHBOARDS_KEY: &str = "dashboards";

/// Number of queries kept in the history
pub const HISTORY_LIMIT: usize = 10;

pub fn table_widths_key(connection_id: &str, schema: &str, table: &str) -> String {
    format!("table-widths/{}/{}/{}", connection_id, schema, table)
}

/// Storage behind the preferences store
pub trait KeyValueBackend: Send + Sync {
    fn get(&self, key: &str) -> EngineResult<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> EngineResult<()>;
    fn remove(&self, key: &str) -> EngineResult<()>;
    fn keys(&self) -> EngineResult<Vec<String>>;
}

/// One JSON object on disk, cached after the first read
pub struct FileBackend {
    path: PathBuf,
    cache: RwLock<Option<BTreeMap<String, Value>>>,
}

impl FileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cache: RwLock::new(None),
        }
    }

    fn load(&self) -> BTreeMap<String, Value> {
        if let Some(cached) = self.cache.read().as_ref() {
            return cached.clone();
        }

        let entries = match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Failed to parse preferences file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        *self.cache.write() = Some(entries.clone());
        entries
    }

    fn write(&self, entries: BTreeMap<String, Value>) -> EngineResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::internal(format!("Failed to create storage directory: {}", e))
            })?;
        }
        let content = serde_json::to_string_pretty(&entries)
            .map_err(|e| EngineError::internal(format!("Failed to serialize preferences: {}", e)))?;
        fs::write(&self.path, content)
            .map_err(|e| EngineError::internal(format!("Failed to write preferences: {}", e)))?;
        *self.cache.write() = Some(entries);
        Ok(())
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> EngineResult<Option<Value>> {
        Ok(self.load().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        let mut entries = self.load();
        entries.insert(key.to_string(), value);
        self.write(entries)
    }

    fn remove(&self, key: &str) -> EngineResult<()> {
        let mut entries = self.load();
        if entries.remove(key).is_some() {
            self.write(entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> EngineResult<Vec<String>> {
        Ok(self.load().into_keys().collect())
    }
}

/// In-memory backend for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> EngineResult<Option<Value>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> EngineResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> EngineResult<Vec<String>> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Typed access to the preference keys
#[derive(Clone)]
pub struct PreferencesStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl PreferencesStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    pub fn file(path: PathBuf) -> Self {
        Self::new(Arc::new(FileBackend::new(path)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Reads `key`. A value that no longer matches `T` reads as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> EngineResult<Option<T>> {
        let Some(value) = self.backend.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable preference");
                Ok(None)
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> EngineResult<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| EngineError::internal(format!("Failed to serialize preference: {}", e)))?;
        self.backend.set(key, value)
    }

    pub fn remove(&self, key: &str) -> EngineResult<()> {
        self.backend.remove(key)
    }

    pub fn table_widths(
        &self,
        connection_id: &str,
        schema: &str,
        table: &str,
    ) -> EngineResult<Option<SavedWidths>> {
        self.get(&table_widths_key(connection_id, schema, table))
    }

    pub fn save_table_widths(
        &self,
        connection_id: &str,
        schema: &str,
        table: &str,
        widths: &SavedWidths,
    ) -> EngineResult<()> {
        self.set(&table_widths_key(connection_id, schema, table), widths)
    }

    pub fn query_history(&self) -> EngineResult<Vec<String>> {
        Ok(self.get(HISTORY_KEY)?.unwrap_or_default())
    }

    /// Moves `sql` to the front of the history, dropping duplicates and
    /// anything past `HISTORY_LIMIT`. Blank SQL is ignored.
    pub fn push_history(&self, sql: &str) -> EngineResult<Vec<String>> {
        let mut history = self.query_history()?;
        if sql.trim().is_empty() {
            return Ok(history);
        }
        history.retain(|q| q != sql);
        history.insert(0, sql.to_string());
        history.truncate(HISTORY_LIMIT);
        self.set(HISTORY_KEY, &history)?;
        Ok(history)
    }

    /// Drops every preference except the query history. Returns the number
    /// of keys removed.
    pub fn reset_keep_history(&self) -> EngineResult<usize> {
        let mut removed = 0;
        for key in self.backend.keys()? {
            if key != HISTORY_KEY {
                self.backend.remove(&key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn history_keeps_ten_unique_newest_first() {
        let prefs = PreferencesStore::in_memory();
        for i in 0..12 {
            prefs.push_history(&format!("SELECT {i}")).unwrap();
        }
        prefs.push_history("SELECT 5").unwrap();
        prefs.push_history("   ").unwrap();

        let history = prefs.query_history().unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0], "SELECT 5");
        assert_eq!(history[1], "SELECT 11");
        assert_eq!(history.iter().filter(|q| *q == "SELECT 5").count(), 1);
        assert!(!history.contains(&"SELECT 0".to_string()));
    }

    #[test]
    fn table_widths_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");

        let mut widths = SavedWidths::new();
        widths.insert("id".to_string(), 90);
        PreferencesStore::file(path.clone())
            .save_table_widths("conn-1", "public", "orders", &widths)
            .unwrap();

        let reopened = PreferencesStore::file(path.clone());
        assert_eq!(
            reopened.table_widths("conn-1", "public", "orders").unwrap(),
            Some(widths)
        );
        assert_eq!(reopened.table_widths("conn-1", "public", "users").unwrap(), None);

        let raw = std::fs::read_to_string(path).unwrap();
        assert!(raw.contains("table-widths/conn-1/public/orders"));
    }

    #[test]
    fn unreadable_values_read_as_absent() {
        let prefs = PreferencesStore::in_memory();
        prefs.set(HISTORY_KEY, &"not a list").unwrap();
        assert!(prefs.query_history().unwrap().is_empty());
    }

    #[test]
    fn reset_keeps_only_history() {
        let prefs = PreferencesStore::in_memory();
        prefs.push_history("SELECT 1").unwrap();
        prefs.set(SAVED_CHARTS_KEY, &Vec::<String>::new()).unwrap();
        prefs
            .save_table_widths("c", "s", "t", &SavedWidths::new())
            .unwrap();

        assert_eq!(prefs.reset_keep_history().unwrap(), 2);
        assert_eq!(prefs.query_history().unwrap(), vec!["SELECT 1".to_string()]);
        assert_eq!(prefs.get::<Vec<String>>(SAVED_CHARTS_KEY).unwrap(), None);
    }
}
