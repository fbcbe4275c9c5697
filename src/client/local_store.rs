//! Durable local key-value storage: the browser `localStorage` stand-in.
//!
//! Values are strings. Lists and profile records are stored as JSON text; the
//! session token and role are stored raw, exactly as the pages write them.
//! Readers must tolerate absent or unparsable keys and treat them as empty.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Well-known keys shared by every page.
pub mod keys {
    pub const AUTH_TOKEN: &str = "authToken";
    pub const ROLE: &str = "role";
    pub const USER_DATA: &str = "userData";
    pub const COMPLAINTS: &str = "complaints";
    pub const ACTIVITY_LOGS: &str = "activityLogs";
    pub const USER_FEEDBACK: &str = "userFeedback";
}

#[derive(Debug, Error)]
pub enum LocalStoreError {
    #[error("local store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("local store encoding: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait LocalStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;
    fn remove_item(&self, key: &str) -> Result<(), LocalStoreError>;
}

/// Decode a JSON value stored under `key`. Absent or malformed values read as `None`.
pub fn read_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Option<T> {
    let raw = store.get_item(key)?;
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(key, error = %e, "ignoring unparsable local value");
            None
        }
    }
}

/// Decode a stored JSON array element by element. Elements that do not fit `T`
/// are skipped; an absent or non-array value reads as empty.
pub fn read_json_list<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Vec<T> {
    let Some(items) = read_json::<Vec<serde_json::Value>>(store, key) else { return Vec::new() };
    let total = items.len();
    let parsed: Vec<T> = items.into_iter().filter_map(|v| serde_json::from_value(v).ok()).collect();
    if parsed.len() < total {
        warn!(key, skipped = total - parsed.len(), "ignoring unparsable list entries");
    }
    parsed
}

pub fn write_json<T: Serialize + ?Sized>(store: &dyn LocalStore, key: &str, value: &T) -> Result<(), LocalStoreError> {
    let s = serde_json::to_string(value)?;
    store.set_item(key, &s)
}

/// Volatile store; a "reload" is simulated by sharing the same instance.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self { Self::default() }
}

impl LocalStore for MemoryLocalStore {
    fn get_item(&self, key: &str) -> Option<String> { self.map.read().get(key).cloned() }

    fn set_item(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        self.map.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), LocalStoreError> {
        self.map.write().remove(key);
        Ok(())
    }
}

/// Store persisted as one JSON object file. Every write rewrites the file via a
/// temp file + rename, so a reopened store sees the last completed write.
#[derive(Debug)]
pub struct FileLocalStore {
    path: PathBuf,
    map: RwLock<HashMap<String, String>>,
}

impl FileLocalStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LocalStoreError> {
        let path = path.as_ref().to_path_buf();
        let map = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<HashMap<String, String>>(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "local store file unreadable; starting empty");
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, map: RwLock::new(map) })
    }

    pub fn path(&self) -> &Path { &self.path }

    fn flush(&self, map: &HashMap<String, String>) -> Result<(), LocalStoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() { std::fs::create_dir_all(dir)?; }
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LocalStore for FileLocalStore {
    fn get_item(&self, key: &str) -> Option<String> { self.map.read().get(key).cloned() }

    // Changes land on a copy; the live map is swapped only once the file is written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        let mut map = self.map.write();
        let mut next = map.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *map = next;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), LocalStoreError> {
        let mut map = self.map.write();
        if !map.contains_key(key) {
            return Ok(());
        }
        let mut next = map.clone();
        next.remove(key);
        self.flush(&next)?;
        *map = next;
        Ok(())
    }
}
