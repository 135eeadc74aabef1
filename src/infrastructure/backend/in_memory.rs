//! In-memory backend implementation

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::domain::backend::Backend;
use crate::domain::MemoError;

use super::pattern::compile_pattern;

#[derive(Debug, Clone)]
struct StoredFile {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

/// Thread-safe in-memory backend
///
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    files: RwLock<BTreeMap<String, StoredFile>>,
    dirs: RwLock<BTreeSet<String>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the modification time of a stored file
    pub fn set_modified(&self, path: &str, modified: DateTime<Utc>) -> Result<(), MemoError> {
        let mut files = self.files.write().map_err(|e| {
            MemoError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let file = files
            .get_mut(path)
            .ok_or_else(|| MemoError::not_found(format!("No such file: {}", path)))?;
        file.modified = modified;
        Ok(())
    }

    /// Number of stored files
    pub fn len(&self) -> usize {
        self.files.read().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Backend for InMemoryBackend {
    fn protocol(&self) -> &'static str {
        "memory"
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, MemoError> {
        let files = self.files.read().map_err(|e| {
            MemoError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        files
            .get(path)
            .map(|file| file.data.clone())
            .ok_or_else(|| MemoError::not_found(format!("No such file: {}", path)))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), MemoError> {
        let mut files = self.files.write().map_err(|e| {
            MemoError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        files.insert(
            path.to_string(),
            StoredFile {
                data: data.to_vec(),
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    fn exists(&self, path: &str) -> Result<bool, MemoError> {
        let files = self.files.read().map_err(|e| {
            MemoError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        if files.contains_key(path) {
            return Ok(true);
        }

        let dirs = self.dirs.read().map_err(|e| {
            MemoError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(dirs.contains(path.trim_end_matches('/')))
    }

    fn glob(&self, pattern: &str) -> Result<Vec<String>, MemoError> {
        let matcher = compile_pattern(pattern)?;
        let files = self.files.read().map_err(|e| {
            MemoError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(files
            .keys()
            .filter(|path| matcher.is_match(path.as_str()))
            .cloned()
            .collect())
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), MemoError> {
        let mut files = self.files.write().map_err(|e| {
            MemoError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let file = files
            .remove(from)
            .ok_or_else(|| MemoError::not_found(format!("No such file: {}", from)))?;
        files.insert(to.to_string(), file);
        Ok(())
    }

    fn modified(&self, path: &str) -> Result<DateTime<Utc>, MemoError> {
        let files = self.files.read().map_err(|e| {
            MemoError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        files
            .get(path)
            .map(|file| file.modified)
            .ok_or_else(|| MemoError::not_found(format!("No such file: {}", path)))
    }

    fn mkdir(&self, path: &str) -> Result<(), MemoError> {
        let mut dirs = self.dirs.write().map_err(|e| {
            MemoError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let absolute = path.starts_with('/');
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() || absolute {
                current.push('/');
            }
            current.push_str(segment);
            dirs.insert(current.clone());
        }
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<(), MemoError> {
        let mut files = self.files.write().map_err(|e| {
            MemoError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| MemoError::not_found(format!("No such file: {}", path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read() {
        let backend = InMemoryBackend::new();
        backend.write("demo.add/k", b"3").unwrap();

        assert_eq!(backend.read("demo.add/k").unwrap(), b"3".to_vec());
        assert!(backend.exists("demo.add/k").unwrap());
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_read_missing() {
        let backend = InMemoryBackend::new();

        let result = backend.read("missing");
        assert!(matches!(result, Err(MemoError::NotFound { .. })));
    }

    #[test]
    fn test_mkdir_creates_parents() {
        let backend = InMemoryBackend::new();
        backend.mkdir("cache/demo.add").unwrap();

        assert!(backend.exists("cache").unwrap());
        assert!(backend.exists("cache/demo.add").unwrap());
        assert!(!backend.exists("demo.add").unwrap());
    }

    #[test]
    fn test_mkdir_absolute() {
        let backend = InMemoryBackend::new();
        backend.mkdir("/tmp/cache/").unwrap();

        assert!(backend.exists("/tmp").unwrap());
        assert!(backend.exists("/tmp/cache").unwrap());
    }

    #[test]
    fn test_glob() {
        let backend = InMemoryBackend::new();
        backend.write("f/k", b"1").unwrap();
        backend.write("f/k.inputs", b"{}").unwrap();
        backend.write("f/k-1", b"0").unwrap();
        backend.write("f/other", b"2").unwrap();
        backend.write("f/nested/k", b"x").unwrap();

        assert_eq!(
            backend.glob("f/k*").unwrap(),
            vec!["f/k".to_string(), "f/k-1".to_string(), "f/k.inputs".to_string()]
        );
        assert_eq!(backend.glob("f/*.inputs").unwrap(), vec!["f/k.inputs".to_string()]);
        assert_eq!(backend.glob("f/*").unwrap().len(), 4);
    }

    #[test]
    fn test_rename_keeps_modified_time() {
        let backend = InMemoryBackend::new();
        backend.write("f/k", b"1").unwrap();
        let past = Utc::now() - chrono::Duration::hours(1);
        backend.set_modified("f/k", past).unwrap();

        backend.rename("f/k", "f/k-1").unwrap();

        assert!(!backend.exists("f/k").unwrap());
        assert_eq!(backend.read("f/k-1").unwrap(), b"1".to_vec());
        assert_eq!(backend.modified("f/k-1").unwrap(), past);
    }

    #[test]
    fn test_rename_missing() {
        let backend = InMemoryBackend::new();
        assert!(backend.rename("a", "b").is_err());
    }

    #[test]
    fn test_remove() {
        let backend = InMemoryBackend::new();
        backend.write("f/k", b"1").unwrap();

        backend.remove("f/k").unwrap();
        assert!(backend.is_empty());
        assert!(matches!(
            backend.remove("f/k"),
            Err(MemoError::NotFound { .. })
        ));
    }
}
