//! Key/value storage media for the storage adapter.
//!
//! # Design
//! `Storage` mirrors the web storage surface: string values under string
//! keys, plus `len`/`key(i)` enumeration for bulk clearing. `MemoryStorage`
//! lives as long as the process, like session storage. `FileStorage` keeps
//! the whole map in a JSON file, like local storage. Both are clone-friendly
//! handles onto shared state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::ApiError;

/// A string key/value store.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, ApiError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), ApiError>;

    fn remove_item(&self, key: &str) -> Result<(), ApiError>;

    fn len(&self) -> Result<usize, ApiError>;

    /// The key at `index` in the store's enumeration order.
    fn key(&self, index: usize) -> Result<Option<String>, ApiError>;

    fn is_empty(&self) -> Result<bool, ApiError> {
        Ok(self.len()? == 0)
    }

    /// Remove every key starting with `prefix`. Returns how many went.
    fn clear_prefix(&self, prefix: &str) -> Result<usize, ApiError> {
        let mut doomed = Vec::new();
        for index in 0..self.len()? {
            if let Some(key) = self.key(index)? {
                if key.starts_with(prefix) {
                    doomed.push(key);
                }
            }
        }
        for key in &doomed {
            self.remove_item(key)?;
        }
        Ok(doomed.len())
    }
}

type Items = Arc<RwLock<BTreeMap<String, String>>>;

fn poisoned<T>(_: T) -> ApiError {
    ApiError::Storage("lock poisoned".into())
}

/// In-memory storage. Clones share the same items.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Items,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, ApiError> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let mut items = self.items.write().map_err(poisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), ApiError> {
        let mut items = self.items.write().map_err(poisoned)?;
        items.remove(key);
        Ok(())
    }

    fn len(&self) -> Result<usize, ApiError> {
        Ok(self.items.read().map_err(poisoned)?.len())
    }

    fn key(&self, index: usize) -> Result<Option<String>, ApiError> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.keys().nth(index).cloned())
    }
}

/// Storage persisted as one JSON object in a file.
///
/// The file is read once on open and rewritten after every change. A change
/// only becomes visible once the rewrite succeeds.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    items: Items,
}

impl FileStorage {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ApiError> {
        let path = path.into();
        let items = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| ApiError::DeserializationError(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(ApiError::Storage(format!("{}: {e}", path.display()))),
        };
        Ok(Self {
            path,
            items: Arc::new(RwLock::new(items)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), ApiError> {
        let text = serde_json::to_string_pretty(items).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        std::fs::write(&self.path, text).map_err(|e| ApiError::Storage(format!("{}: {e}", self.path.display())))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, ApiError> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let mut items = self.items.write().map_err(poisoned)?;
        let mut next = items.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *items = next;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), ApiError> {
        let mut items = self.items.write().map_err(poisoned)?;
        if !items.contains_key(key) {
            return Ok(());
        }
        let mut next = items.clone();
        next.remove(key);
        self.persist(&next)?;
        *items = next;
        Ok(())
    }

    fn len(&self) -> Result<usize, ApiError> {
        Ok(self.items.read().map_err(poisoned)?.len())
    }

    fn key(&self, index: usize) -> Result<Option<String>, ApiError> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.keys().nth(index).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clones_share_items() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.set_item("a", "1").unwrap();
        assert_eq!(other.get_item("a").unwrap().as_deref(), Some("1"));
        other.remove_item("a").unwrap();
        assert!(storage.is_empty().unwrap());
    }

    #[test]
    fn clear_prefix_enumerates_keys() {
        let storage = MemoryStorage::new();
        storage.set_item("ns-posts", "[]").unwrap();
        storage.set_item("ns-users", "[]").unwrap();
        storage.set_item("other", "x").unwrap();
        assert_eq!(storage.clear_prefix("ns-").unwrap(), 2);
        assert_eq!(storage.len().unwrap(), 1);
        assert_eq!(storage.key(0).unwrap().as_deref(), Some("other"));
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set_item("ns-posts", r#"[{"id":0}]"#).unwrap();
        storage.set_item("ns-tmp", "x").unwrap();
        storage.remove_item("ns-tmp").unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("ns-posts").unwrap().as_deref(), Some(r#"[{"id":0}]"#));
        assert_eq!(reopened.len().unwrap(), 1);
    }

    #[test]
    fn failed_writes_leave_items_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.set_item("kept", "1").unwrap();

        // Pull the directory out from under the store so every rewrite fails.
        std::fs::remove_file(&path).unwrap();
        std::fs::remove_dir(dir.path()).unwrap();

        let err = storage.set_item("lost", "2").unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)), "{err:?}");
        assert_eq!(storage.get_item("lost").unwrap(), None);

        let err = storage.remove_item("kept").unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)), "{err:?}");
        assert_eq!(storage.get_item("kept").unwrap().as_deref(), Some("1"));
        assert_eq!(storage.len().unwrap(), 1);
    }

    #[test]
    fn corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();
        let err = FileStorage::open(&path).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }
}
