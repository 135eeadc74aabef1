//! Storage backend trait definition

use chrono::{DateTime, Utc};

use crate::domain::MemoError;

#[cfg(test)]
use mockall::automock;

/// Byte storage over a hierarchical, `/`-separated path namespace
///
/// Operations are synchronous and blocking. The engine performs no locking of
/// its own, so atomicity of `write` and `rename` is whatever the
/// implementation provides.
#[cfg_attr(test, automock)]
pub trait Backend: Send + Sync {
    /// Short protocol name used in log lines (e.g. `memory`, `file`)
    fn protocol(&self) -> &'static str;

    /// Reads the full contents of a file
    fn read(&self, path: &str) -> Result<Vec<u8>, MemoError>;

    /// Creates or truncates a file and writes `data` to it
    fn write(&self, path: &str, data: &[u8]) -> Result<(), MemoError>;

    /// Checks whether a file or directory exists at `path`
    fn exists(&self, path: &str) -> Result<bool, MemoError>;

    /// Lists file paths matching a glob pattern; `*` never crosses `/`
    fn glob(&self, pattern: &str) -> Result<Vec<String>, MemoError>;

    /// Moves a file, replacing the destination if present
    fn rename(&self, from: &str, to: &str) -> Result<(), MemoError>;

    /// Returns the last modification time of a file
    fn modified(&self, path: &str) -> Result<DateTime<Utc>, MemoError>;

    /// Creates a directory and any missing parents
    fn mkdir(&self, path: &str) -> Result<(), MemoError>;

    /// Removes a file
    fn remove(&self, path: &str) -> Result<(), MemoError>;
}
