//! Filesystem-backed storage for saved plans.
//!
//! Values live as pretty-printed JSON files under a root directory, addressed
//! by key segments (`["plans", "01J..."]` -> `<root>/plans/01J....json`).

mod plans;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

pub use plans::{PlanRecord, PlanStore};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// More than one plan id starts with the given prefix.
    #[error("ambiguous id prefix '{0}'")]
    Ambiguous(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage result type.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage backend for persisting data.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Create a new storage instance at the default location.
    ///
    /// # Errors
    ///
    /// Returns error if data directory cannot be determined.
    pub fn new() -> anyhow::Result<Self> {
        let root = Config::data_dir()?.join("storage");
        Ok(Self { root })
    }

    /// Create a storage instance at a custom location.
    #[must_use]
    pub const fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the storage root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &[&str]) -> PathBuf {
        let mut path = self.root.clone();
        for segment in key {
            path.push(segment);
        }
        path.set_extension("json");
        path
    }

    /// Read a value from storage.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or cannot be parsed.
    pub fn read<T>(&self, key: &[&str]) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let path = self.path(key);

        if !path.exists() {
            return Err(StorageError::NotFound(key.join("/")));
        }

        let contents = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write a value to storage.
    ///
    /// The file is written to a temporary sibling first and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be written.
    pub fn write<T>(&self, key: &[&str], value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let path = self.path(key);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Update a value in storage.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or cannot be updated.
    pub fn update<T, F>(&self, key: &[&str], f: F) -> Result<T>
    where
        T: for<'de> Deserialize<'de> + Serialize,
        F: FnOnce(&mut T),
    {
        let mut value: T = self.read(key)?;
        f(&mut value);
        self.write(key, &value)?;
        Ok(value)
    }

    /// Remove a value from storage.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be removed.
    pub fn remove(&self, key: &[&str]) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// List the keys directly under a prefix (file stems, sorted).
    ///
    /// # Errors
    ///
    /// Returns error if directory cannot be read.
    pub fn list(&self, prefix: &[&str]) -> Result<Vec<String>> {
        let mut dir = self.root.clone();
        for segment in prefix {
            dir.push(segment);
        }

        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem() {
                    keys.push(stem.to_string_lossy().to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// Check if a key exists.
    #[must_use]
    pub fn exists(&self, key: &[&str]) -> bool {
        self.path(key).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        id: String,
        value: i32,
    }

    fn temp_storage() -> (Storage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_root(dir.path().to_path_buf());
        (storage, dir)
    }

    fn data(id: &str, value: i32) -> TestData {
        TestData {
            id: id.to_string(),
            value,
        }
    }

    #[test]
    fn write_and_read() {
        let (storage, _dir) = temp_storage();
        storage.write(&["test", "data"], &data("test", 42)).unwrap();

        let read: TestData = storage.read(&["test", "data"]).unwrap();
        assert_eq!(read, data("test", 42));
        assert!(!storage.root().join("test").join("data.json.tmp").exists());
    }

    #[test]
    fn read_not_found() {
        let (storage, _dir) = temp_storage();
        let result: Result<TestData> = storage.read(&["nonexistent"]);
        assert!(matches!(result, Err(StorageError::NotFound(ref k)) if k == "nonexistent"));
    }

    #[test]
    fn update() {
        let (storage, _dir) = temp_storage();
        storage.write(&["test", "data"], &data("test", 42)).unwrap();

        let updated: TestData = storage
            .update(&["test", "data"], |d: &mut TestData| d.value = 100)
            .unwrap();
        assert_eq!(updated.value, 100);

        let read: TestData = storage.read(&["test", "data"]).unwrap();
        assert_eq!(read.value, 100);
    }

    #[test]
    fn remove() {
        let (storage, _dir) = temp_storage();
        storage.write(&["test", "data"], &data("test", 42)).unwrap();
        assert!(storage.exists(&["test", "data"]));

        storage.remove(&["test", "data"]).unwrap();
        assert!(!storage.exists(&["test", "data"]));

        // Removing again is not an error
        storage.remove(&["test", "data"]).unwrap();
    }

    #[test]
    fn list_returns_sorted_stems() {
        let (storage, _dir) = temp_storage();
        storage.write(&["plans", "b"], &data("b", 2)).unwrap();
        storage.write(&["plans", "a"], &data("a", 1)).unwrap();
        storage.write(&["other"], &data("o", 0)).unwrap();

        assert_eq!(storage.list(&["plans"]).unwrap(), vec!["a", "b"]);
        assert!(storage.list(&["missing"]).unwrap().is_empty());
    }
}
