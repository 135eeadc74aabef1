//! Backend factory for runtime selection

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::backend::Backend;
use crate::domain::MemoError;

use super::in_memory::InMemoryBackend;
use super::local::LocalBackend;

/// Supported backend types
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendType {
    /// Process-local, in-memory storage
    InMemory,
    /// Files on the local disk
    #[default]
    Local,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::InMemory => write!(f, "memory"),
            BackendType::Local => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for BackendType {
    type Err = MemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in_memory" | "inmemory" | "in-memory" => Ok(BackendType::InMemory),
            "file" | "local" => Ok(BackendType::Local),
            _ => Err(MemoError::configuration(format!(
                "Unknown backend protocol: {}. Valid protocols: memory, file",
                s
            ))),
        }
    }
}

/// Factory for creating backend instances
#[derive(Debug, Default)]
pub struct BackendFactory;

impl BackendFactory {
    /// Creates a new backend factory
    pub fn new() -> Self {
        Self
    }

    /// Creates a backend from a protocol name and its options
    ///
    /// The `file` backend understands a `root` option; other options are
    /// ignored.
    pub fn create(
        &self,
        protocol: &str,
        options: &HashMap<String, String>,
    ) -> Result<Arc<dyn Backend>, MemoError> {
        let backend_type: BackendType = protocol.parse()?;
        debug!(%backend_type, ?options, "Creating backend");

        match backend_type {
            BackendType::InMemory => Ok(self.create_in_memory()),
            BackendType::Local => match options.get("root") {
                Some(root) => Ok(self.create_local(root)),
                None => Ok(Arc::new(LocalBackend::new())),
            },
        }
    }

    /// Creates an in-memory backend
    pub fn create_in_memory(&self) -> Arc<dyn Backend> {
        Arc::new(InMemoryBackend::new())
    }

    /// Creates a local-disk backend rooted at `root`
    pub fn create_local(&self, root: impl Into<std::path::PathBuf>) -> Arc<dyn Backend> {
        Arc::new(LocalBackend::with_root(root))
    }
}
