//! Settings-backed configuration provider

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::Settings;
use crate::domain::cache::{CacheConfig, ConfigProvider, ResolvedLocation};
use crate::domain::MemoError;
use crate::infrastructure::backend::BackendFactory;

/// Resolves the default backend from `MEMOKIT__FS__*` settings
#[derive(Debug, Default)]
pub struct EnvConfigProvider {
    factory: BackendFactory,
    vars: Option<HashMap<String, String>>,
}

impl EnvConfigProvider {
    /// Reads the process environment (and `.env`) on every resolution
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the given variables instead of the process environment
    pub fn with_vars(vars: HashMap<String, String>) -> Self {
        Self {
            factory: BackendFactory::new(),
            vars: Some(vars),
        }
    }

    fn settings(&self) -> Result<Settings, MemoError> {
        let settings = match &self.vars {
            Some(vars) => Settings::from_env_map(vars.clone()),
            None => {
                dotenvy::dotenv().ok();
                Settings::load()
            }
        };

        settings.map_err(|e| MemoError::configuration(format!("Failed to load settings: {}", e)))
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn resolve(&self) -> Result<Option<ResolvedLocation>, MemoError> {
        let settings = self.settings()?;

        let Some(protocol) = settings.fs.protocol else {
            debug!("No backend protocol configured");
            return Ok(None);
        };

        debug!(
            protocol = %protocol,
            prefix = ?settings.fs.prefix,
            "Initialising backend from settings"
        );

        let backend = self
            .factory
            .create(&protocol, &settings.fs.storage_options)?;

        Ok(Some(ResolvedLocation::new(backend, settings.fs.prefix)))
    }
}

/// Configuration whose backend and prefix come from the environment
pub fn default_cache_config() -> CacheConfig {
    CacheConfig::new().with_provider(Arc::new(EnvConfigProvider::new()))
}
