//! Memoized function wrapper

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::cache::{CacheConfig, FunctionId, RecordKind};
use crate::domain::signature::{Arguments, CallArgs, Signature};
use crate::domain::{CallError, MemoError};
use crate::infrastructure::observability::{record_execution, record_lookup, LookupOutcome};

use super::cache_manager::CacheManager;
use super::record_store::RecordStore;

/// What the cache holds for one call
enum Lookup<T, E> {
    Hit(T),
    Replay(E),
    Miss { base: String, key: String },
}

/// A function whose results and faults are persisted per argument mapping
///
/// The wrapped function receives the full bound [`Arguments`], including
/// parameters excluded from the key.
pub struct Memoized<F> {
    func: Arc<F>,
    manager: CacheManager,
    label: String,
}

impl<F> Clone for Memoized<F> {
    fn clone(&self) -> Self {
        Self {
            func: self.func.clone(),
            manager: self.manager.clone(),
            label: self.label.clone(),
        }
    }
}

impl<F> std::fmt::Debug for Memoized<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized")
            .field("function", &self.label)
            .field("manager", &self.manager)
            .finish()
    }
}

impl<F> Memoized<F> {
    pub fn new(function: FunctionId, signature: Signature, func: F, config: Arc<CacheConfig>) -> Self {
        let label = function.qualified_name();
        Self {
            func: Arc::new(func),
            manager: CacheManager::new(function, signature, config),
            label,
        }
    }

    /// Management surface of this function's cache
    pub fn cache(&self) -> &CacheManager {
        &self.manager
    }

    /// Same function, different configuration
    pub fn with_config(&self, config: CacheConfig) -> Self {
        Self {
            func: self.func.clone(),
            manager: CacheManager::new(
                self.manager.function().clone(),
                self.manager.signature().clone(),
                Arc::new(config),
            ),
            label: self.label.clone(),
        }
    }

    pub fn call<T, E>(&self, args: CallArgs) -> Result<T, CallError<E>>
    where
        F: Fn(&Arguments) -> Result<T, E>,
        T: Serialize + DeserializeOwned,
        E: Serialize + DeserializeOwned,
    {
        let arguments = self.manager.signature().bind(&args)?;

        match self.lookup(&arguments)? {
            Lookup::Hit(value) => Ok(value),
            Lookup::Replay(fault) => Err(CallError::Function(fault)),
            Lookup::Miss { base, key } => {
                let started = Instant::now();
                let result = (self.func)(&arguments);
                self.settle(&base, &key, result, started.elapsed())
            }
        }
    }

    /// Asynchronous counterpart of [`Memoized::call`]
    ///
    /// Only the wrapped function is awaited; cache I/O runs inline.
    pub async fn call_async<T, E, Fut>(&self, args: CallArgs) -> Result<T, CallError<E>>
    where
        F: Fn(Arguments) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize + DeserializeOwned,
        E: Serialize + DeserializeOwned,
    {
        let arguments = self.manager.signature().bind(&args)?;

        match self.lookup(&arguments)? {
            Lookup::Hit(value) => Ok(value),
            Lookup::Replay(fault) => Err(CallError::Function(fault)),
            Lookup::Miss { base, key } => {
                let started = Instant::now();
                let result = (self.func)(arguments).await;
                self.settle(&base, &key, result, started.elapsed())
            }
        }
    }

    fn lookup<T, E>(&self, arguments: &Arguments) -> Result<Lookup<T, E>, MemoError>
    where
        T: DeserializeOwned,
        E: DeserializeOwned,
    {
        let config = self.manager.config();
        let keyed = arguments.without(config.excluded());
        let key = self.manager.key_of(&keyed)?;
        let base = self.manager.base_path()?;
        let store = RecordStore::new(config)?;

        let output_path = RecordKind::Output.path(&base, &key);
        if config.validator_chain().is_valid(store.backend(), &output_path) {
            debug!(function = %self.label, key = %key, "Cache hit");
            let value = store.read_output(&base, &key)?;
            record_lookup(&self.label, LookupOutcome::Hit);
            return Ok(Lookup::Hit(value));
        }

        if store
            .backend()
            .exists(&RecordKind::Exception.path(&base, &key))?
        {
            debug!(function = %self.label, key = %key, "Replaying stored fault");
            let fault = store.read_exception(&base, &key)?;
            record_lookup(&self.label, LookupOutcome::FaultReplayed);
            return Ok(Lookup::Replay(fault));
        }

        debug!(function = %self.label, key = %key, "Cache miss");
        record_lookup(&self.label, LookupOutcome::Miss);

        if let Err(e) = store.write_inputs(&base, &key, &keyed) {
            warn!(
                function = %self.label,
                key = %key,
                error = %e,
                "Failed to store input record"
            );
        }

        Ok(Lookup::Miss { base, key })
    }

    fn settle<T, E>(
        &self,
        base: &str,
        key: &str,
        result: Result<T, E>,
        elapsed: Duration,
    ) -> Result<T, CallError<E>>
    where
        T: Serialize,
        E: Serialize,
    {
        record_execution(&self.label, elapsed, result.is_ok());

        match result {
            Ok(value) => {
                RecordStore::new(self.manager.config())?.write_output(base, key, &value)?;
                debug!(function = %self.label, key = %key, "Stored output");
                Ok(value)
            }
            Err(fault) => {
                let stored = RecordStore::new(self.manager.config())
                    .and_then(|store| store.write_exception(base, key, &fault));

                match stored {
                    Ok(()) => debug!(function = %self.label, key = %key, "Stored fault"),
                    Err(e) => warn!(
                        function = %self.label,
                        key = %key,
                        error = %e,
                        "Failed to store fault record"
                    ),
                }

                Err(CallError::Function(fault))
            }
        }
    }
}
