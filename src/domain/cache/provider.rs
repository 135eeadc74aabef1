//! Process-wide configuration provider contract

use std::fmt;
use std::sync::Arc;

use crate::domain::backend::Backend;
use crate::domain::MemoError;

/// Backend and prefix obtained from ambient configuration
#[derive(Clone)]
pub struct ResolvedLocation {
    pub backend: Arc<dyn Backend>,
    pub prefix: Option<String>,
}

impl ResolvedLocation {
    pub fn new(backend: Arc<dyn Backend>, prefix: Option<String>) -> Self {
        Self { backend, prefix }
    }
}

impl fmt::Debug for ResolvedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedLocation")
            .field("protocol", &self.backend.protocol())
            .field("prefix", &self.prefix)
            .finish()
    }
}

/// Source of the default backend and prefix
///
/// `resolve` should be a pure function of the ambient configuration: it may
/// run again after a configuration is reset. `Ok(None)` means nothing is
/// configured.
pub trait ConfigProvider: Send + Sync {
    fn resolve(&self) -> Result<Option<ResolvedLocation>, MemoError>;
}
