//! Built-in entry validators

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::backend::Backend;
use crate::domain::MemoError;

/// Predicate deciding whether a stored entry is still usable
///
/// Returning an error counts as a failed check.
pub trait Validator: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn validate(&self, backend: &dyn Backend, path: &str) -> Result<bool, MemoError>;
}

/// Passes when the entry exists
#[derive(Debug, Clone, Copy, Default)]
pub struct Exists;

impl Validator for Exists {
    fn name(&self) -> &str {
        "exists"
    }

    fn validate(&self, backend: &dyn Backend, path: &str) -> Result<bool, MemoError> {
        backend.exists(path)
    }
}

/// Time-to-live of a cached entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Entry is valid while younger than this
    For(Duration),
    /// Entry is valid until this instant
    Until(DateTime<Utc>),
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Self::For(duration)
    }
}

impl From<DateTime<Utc>> for Ttl {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::Until(instant)
    }
}

/// Passes while the entry has not outlived its TTL
#[derive(Debug, Clone, Copy)]
pub struct TtlValidator {
    ttl: Ttl,
}

impl TtlValidator {
    pub fn new(ttl: Ttl) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }
}

impl Validator for TtlValidator {
    fn name(&self) -> &str {
        "ttl"
    }

    fn validate(&self, backend: &dyn Backend, path: &str) -> Result<bool, MemoError> {
        let now = Utc::now();

        match self.ttl {
            Ttl::Until(instant) => Ok(now < instant),
            Ttl::For(ttl) => {
                let modified = backend.modified(path)?;
                // Modification times in the future count as age zero
                let age = (now - modified).to_std().unwrap_or(Duration::ZERO);
                Ok(age < ttl)
            }
        }
    }
}

type ValidatorFn = dyn Fn(&dyn Backend, &str) -> Result<bool, MemoError> + Send + Sync;

/// Named validator backed by a closure
#[derive(Clone)]
pub struct FnValidator {
    name: String,
    func: Arc<ValidatorFn>,
}

impl FnValidator {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&dyn Backend, &str) -> Result<bool, MemoError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl Debug for FnValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Validator for FnValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, backend: &dyn Backend, path: &str) -> Result<bool, MemoError> {
        (self.func)(backend, path)
    }
}
