use directories::ProjectDirs;
use fs_err as fs;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const KEY_ENTRIES: &str = "entries";
pub const KEY_WEIGHTS: &str = "weights";
pub const KEY_TEMPLATES: &str = "templates";
pub const KEY_SOUND_ENABLED: &str = "sound_enabled";
pub const KEY_SPIN_DURATION: &str = "spin_duration";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to determine data directory")]
    DataDirNotFound,
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed value: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable key-value port. Values are JSON documents.
pub trait KeyValueStore {
    /// read the value stored under `key`, if any
    fn get(&self, key: &str) -> Option<Value>;

    /// write or overwrite the value stored under `key`
    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
}

/// Decodes `key`, falling back to `T::default()` when it is absent or malformed.
pub fn load_or_default<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    load(store, key).unwrap_or_default()
}

pub fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let value = store.get(key)?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("Ignoring malformed value for '{}': {}", key, e);
            None
        }
    }
}

/// Encodes and writes `value`. Failures are logged, not returned.
pub fn save<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_value(value)
        .map_err(StorageError::from)
        .and_then(|v| store.set(key, v));
    if let Err(e) = result {
        log::error!("Failed to persist '{}': {}", key, e);
    }
}

pub fn default_store_path() -> Result<PathBuf, StorageError> {
    let proj_dirs =
        ProjectDirs::from("org", "roulette", "roulette").ok_or(StorageError::DataDirNotFound)?;
    Ok(proj_dirs.data_dir().join("state.json"))
}

/// Whole-document JSON file. Every write rewrites the file.
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = Self::read_document(&path);
        Self {
            path,
            values: RwLock::new(values),
        }
    }

    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self::open(default_store_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(path: &Path) -> Map<String, Value> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Map::new(),
            Err(e) => {
                log::warn!("Could not read state file: {}", e);
                return Map::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                log::warn!("State file {} is not a JSON object, starting empty", path.display());
                Map::new()
            }
            Err(e) => {
                log::warn!("State file {} is corrupt, starting empty: {}", path.display(), e);
                Map::new()
            }
        }
    }

    fn flush(&self, values: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let doc = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, doc)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut values = self.values.write();
        values.insert(key.to_string(), value);
        self.flush(&values)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        Self {
            values: RwLock::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            ),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = JsonFileStore::open(&path);
        save(&store, KEY_ENTRIES, &vec!["a", "b"]);
        save(&store, KEY_SOUND_ENABLED, &false);

        let reopened = JsonFileStore::open(&path);
        let entries: Vec<String> = load_or_default(&reopened, KEY_ENTRIES);
        assert_eq!(entries, vec!["a", "b"]);
        assert_eq!(reopened.get(KEY_SOUND_ENABLED), Some(json!(false)));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert_eq!(store.get(KEY_TEMPLATES), None);

        save(&store, KEY_WEIGHTS, &vec![1.0, 2.0]);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(serde_json::from_str::<Value>(&raw).is_ok());
    }

    #[test]
    fn test_malformed_value_falls_back_to_default() {
        let store = MemoryStore::with_values([(KEY_WEIGHTS, json!("oops"))]);
        let weights: Vec<f64> = load_or_default(&store, KEY_WEIGHTS);
        assert!(weights.is_empty());
    }
}
