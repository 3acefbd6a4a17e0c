//! File-backed key/value store for native builds
//!
//! The whole store is one JSON object on disk, rewritten on every change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StoreError};

/// Profile file name inside the data directory
const FILE_NAME: &str = "profile.json";

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open (or start) a store at `path`. A missing file is an empty store;
    /// a corrupt one is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring corrupt store {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                log::warn!("Could not read store {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    /// Store in the platform data directory (e.g. `~/.local/share/bug-chase`)
    pub fn default_location() -> Result<Self, StoreError> {
        let dir = dirs::data_dir()
            .ok_or_else(|| StoreError::Unavailable("no data directory".to_string()))?;
        Ok(Self::open(dir.join("bug-chase").join(FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
