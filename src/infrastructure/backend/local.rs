//! Local filesystem backend implementation

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::domain::backend::Backend;
use crate::domain::cache::{file_name, parent_of};
use crate::domain::MemoError;

use super::pattern::{compile_pattern, unescape_literal};

/// Backend storing records as files on the local disk
///
/// Paths are interpreted relative to `root` when one is set, otherwise as
/// given. Glob wildcards are supported in the last path component only.
#[derive(Debug, Clone, Default)]
pub struct LocalBackend {
    root: Option<PathBuf>,
}

impl LocalBackend {
    /// Creates a backend resolving paths against the working directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend resolving paths against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn root(&self) -> Option<&PathBuf> {
        self.root.as_ref()
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => PathBuf::from(path),
        }
    }
}

fn io_error(path: &str, err: io::Error) -> MemoError {
    if err.kind() == io::ErrorKind::NotFound {
        MemoError::not_found(format!("No such file: {}", path))
    } else {
        MemoError::storage(format!("I/O error on '{}': {}", path, err))
    }
}

impl Backend for LocalBackend {
    fn protocol(&self) -> &'static str {
        "file"
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, MemoError> {
        fs::read(self.resolve(path)).map_err(|e| io_error(path, e))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), MemoError> {
        fs::write(self.resolve(path), data).map_err(|e| io_error(path, e))
    }

    fn exists(&self, path: &str) -> Result<bool, MemoError> {
        self.resolve(path).try_exists().map_err(|e| io_error(path, e))
    }

    fn glob(&self, pattern: &str) -> Result<Vec<String>, MemoError> {
        // The directory part is a literal path; only the last component is matched
        let (dir, name_pattern) = match parent_of(pattern) {
            Some(parent) => (Some(unescape_literal(parent)), file_name(pattern)),
            None => (None, pattern),
        };
        let dir = dir.as_deref();

        let matcher = compile_pattern(name_pattern)?;
        let dir_path = match dir {
            Some(dir) => self.resolve(dir),
            None => self.root.clone().unwrap_or_else(|| PathBuf::from(".")),
        };

        let entries = match fs::read_dir(&dir_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(dir.unwrap_or("."), e)),
        };

        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(dir.unwrap_or("."), e))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if !matcher.is_match(&name) {
                continue;
            }

            matches.push(match dir {
                Some("/") => format!("/{}", name),
                Some(dir) => format!("{}/{}", dir, name),
                None => name,
            });
        }

        matches.sort();
        Ok(matches)
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), MemoError> {
        fs::rename(self.resolve(from), self.resolve(to)).map_err(|e| io_error(from, e))
    }

    fn modified(&self, path: &str) -> Result<DateTime<Utc>, MemoError> {
        let modified = fs::metadata(self.resolve(path))
            .and_then(|meta| meta.modified())
            .map_err(|e| io_error(path, e))?;

        Ok(DateTime::<Utc>::from(modified))
    }

    fn mkdir(&self, path: &str) -> Result<(), MemoError> {
        fs::create_dir_all(self.resolve(path)).map_err(|e| io_error(path, e))
    }

    fn remove(&self, path: &str) -> Result<(), MemoError> {
        fs::remove_file(self.resolve(path)).map_err(|e| io_error(path, e))
    }
}
