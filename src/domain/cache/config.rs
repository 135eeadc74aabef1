//! Cache configuration

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::domain::backend::Backend;
use crate::domain::validator::{Exists, Ttl, TtlValidator, Validator, ValidatorChain};
use crate::domain::MemoError;

use super::key::{Codec, JsonCodec};
use super::location::{base_path, normalize_prefix, FunctionId};
use super::provider::{ConfigProvider, ResolvedLocation};

/// What happens to an output record once it has expired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryMode {
    /// The next write replaces the stale record in place
    #[default]
    Remove,
    /// The next write shifts older versions to `key-1`, `key-2`, ...
    Append,
}

#[derive(Debug, Clone)]
enum Resolution {
    Pending,
    Resolved(ResolvedLocation),
    Unavailable(String),
}

/// Settings shared by every function memoized with it
///
/// A configuration is never mutated after construction except for its lazy
/// backend resolution and its memo of created directories. Use `clone()`
/// followed by the `with_*` methods to derive a variant; the original is left
/// untouched.
pub struct CacheConfig {
    backend: Option<Arc<dyn Backend>>,
    prefix: Option<String>,
    input_codec: Arc<dyn Codec>,
    output_codec: Arc<dyn Codec>,
    ttl: Option<Ttl>,
    expiry_mode: ExpiryMode,
    validators: Vec<Arc<dyn Validator>>,
    excluded: BTreeSet<String>,
    provider: Option<Arc<dyn ConfigProvider>>,
    resolution: Mutex<Resolution>,
    parents: Mutex<HashSet<String>>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: None,
            prefix: None,
            input_codec: Arc::new(JsonCodec::new()),
            output_codec: Arc::new(JsonCodec::new()),
            ttl: None,
            expiry_mode: ExpiryMode::default(),
            validators: vec![Arc::new(Exists)],
            excluded: BTreeSet::new(),
            provider: None,
            resolution: Mutex::new(Resolution::Pending),
            parents: Mutex::new(HashSet::new()),
        }
    }
}

impl Clone for CacheConfig {
    fn clone(&self) -> Self {
        let resolution = self
            .resolution
            .lock()
            .map(|r| r.clone())
            .unwrap_or(Resolution::Pending);

        Self {
            backend: self.backend.clone(),
            prefix: self.prefix.clone(),
            input_codec: self.input_codec.clone(),
            output_codec: self.output_codec.clone(),
            ttl: self.ttl,
            expiry_mode: self.expiry_mode,
            validators: self.validators.clone(),
            excluded: self.excluded.clone(),
            provider: self.provider.clone(),
            resolution: Mutex::new(resolution),
            parents: Mutex::new(HashSet::new()),
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("backend", &self.backend.as_ref().map(|b| b.protocol()))
            .field("prefix", &self.prefix)
            .field("input_codec", &self.input_codec.name())
            .field("output_codec", &self.output_codec.name())
            .field("ttl", &self.ttl)
            .field("expiry_mode", &self.expiry_mode)
            .field("validators", &self.validator_chain().names())
            .field("excluded", &self.excluded)
            .field("has_provider", &self.provider.is_some())
            .finish()
    }
}

impl CacheConfig {
    /// Creates a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an explicit backend, skipping lazy resolution
    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the path prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(normalize_prefix(&prefix.into()));
        self
    }

    /// Sets the codec used for input records
    pub fn with_input_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.input_codec = codec;
        self
    }

    /// Sets the codec used for output and exception records
    pub fn with_output_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.output_codec = codec;
        self
    }

    /// Sets the time-to-live, which appends a TTL validator to the chain
    pub fn with_ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    /// Removes the time-to-live
    pub fn without_ttl(mut self) -> Self {
        self.ttl = None;
        self
    }

    /// Sets the expiry mode
    pub fn with_expiry_mode(mut self, mode: ExpiryMode) -> Self {
        self.expiry_mode = mode;
        self
    }

    /// Replaces the validator chain
    pub fn with_validators(mut self, validators: Vec<Arc<dyn Validator>>) -> Self {
        self.validators = validators;
        self
    }

    /// Appends a validator to the chain
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Excludes a parameter from key derivation
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.excluded.insert(name.into());
        self
    }

    /// Sets the provider used to resolve a backend when none is given
    pub fn with_provider(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.provider = Some(provider);
        self.resolution = Mutex::new(Resolution::Pending);
        self
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn input_codec(&self) -> &dyn Codec {
        self.input_codec.as_ref()
    }

    pub fn output_codec(&self) -> &dyn Codec {
        self.output_codec.as_ref()
    }

    pub fn ttl(&self) -> Option<Ttl> {
        self.ttl
    }

    pub fn expiry_mode(&self) -> ExpiryMode {
        self.expiry_mode
    }

    pub fn excluded(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    /// Whether output writes rotate older versions into history
    pub fn rotates_on_write(&self) -> bool {
        self.ttl.is_some() && self.expiry_mode == ExpiryMode::Append
    }

    /// Effective validator chain, with the TTL validator last when a TTL is set
    pub fn validator_chain(&self) -> ValidatorChain {
        let mut chain = ValidatorChain::new(self.validators.clone());

        if let Some(ttl) = self.ttl {
            chain.push(Arc::new(TtlValidator::new(ttl)));
        }

        chain
    }

    /// Backend to use, resolving it from the provider on first use
    pub fn backend(&self) -> Result<Arc<dyn Backend>, MemoError> {
        if let Some(backend) = &self.backend {
            return Ok(backend.clone());
        }

        Ok(self.resolve()?.backend)
    }

    /// Effective prefix; an explicit prefix wins over a resolved one
    pub fn effective_prefix(&self) -> Result<Option<String>, MemoError> {
        if self.prefix.is_some() || self.backend.is_some() {
            return Ok(self.prefix.clone());
        }

        Ok(self.resolve()?.prefix.map(|p| normalize_prefix(&p)))
    }

    /// Base directory of `function`'s records
    pub fn base_path(&self, function: &FunctionId) -> Result<String, MemoError> {
        let prefix = self.effective_prefix()?;
        Ok(base_path(function, prefix.as_deref()))
    }

    /// Whether lazy resolution has produced a backend
    pub fn is_resolved(&self) -> bool {
        self.resolution
            .lock()
            .map(|r| matches!(*r, Resolution::Resolved(_)))
            .unwrap_or(false)
    }

    /// Forgets the lazily resolved backend so the next use resolves again
    pub fn reset(&self) {
        if let Ok(mut resolution) = self.resolution.lock() {
            *resolution = Resolution::Pending;
        }

        if let Ok(mut parents) = self.parents.lock() {
            parents.clear();
        }
    }

    /// Records `parent` as existing; returns false if it was already known
    pub(crate) fn remember_parent(&self, parent: &str) -> Result<bool, MemoError> {
        let mut parents = self
            .parents
            .lock()
            .map_err(|e| MemoError::storage(format!("Failed to acquire parents lock: {}", e)))?;

        Ok(parents.insert(parent.to_string()))
    }

    pub(crate) fn knows_parent(&self, parent: &str) -> Result<bool, MemoError> {
        let parents = self
            .parents
            .lock()
            .map_err(|e| MemoError::storage(format!("Failed to acquire parents lock: {}", e)))?;

        Ok(parents.contains(parent))
    }

    fn resolve(&self) -> Result<ResolvedLocation, MemoError> {
        let mut resolution = self.resolution.lock().map_err(|e| {
            MemoError::configuration(format!("Failed to acquire resolution lock: {}", e))
        })?;

        if let Resolution::Pending = *resolution {
            *resolution = match &self.provider {
                None => Resolution::Unavailable(
                    "No backend supplied and no configuration provider set".to_string(),
                ),
                Some(provider) => match provider.resolve() {
                    Ok(Some(location)) => {
                        debug!(
                            protocol = location.backend.protocol(),
                            prefix = ?location.prefix,
                            "Resolved backend from configuration"
                        );
                        Resolution::Resolved(location)
                    }
                    Ok(None) => Resolution::Unavailable(
                        "Configuration does not define a backend protocol".to_string(),
                    ),
                    Err(e) => {
                        warn!(error = %e, "Failed to resolve backend from configuration");
                        Resolution::Unavailable(e.to_string())
                    }
                },
            };
        }

        match &*resolution {
            Resolution::Resolved(location) => Ok(location.clone()),
            Resolution::Unavailable(reason) => Err(MemoError::configuration(reason.clone())),
            Resolution::Pending => Err(MemoError::configuration("Backend resolution pending")),
        }
    }
}
