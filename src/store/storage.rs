use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{StoreError, StoreResult};

/// Durable string key-value storage the local store persists into
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Storage(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            StoreError::Storage(format!("Failed to create {}: {e}", self.dir.display()))
        })?;
        let path = self.path_for(key);
        fs::write(&path, value)
            .map_err(|e| StoreError::Storage(format!("Failed to write {}: {e}", path.display())))
    }
}

/// In-process storage, gone when dropped
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Storage("memory storage lock poisoned".to_string()))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
