//! Ordered validator chain

use std::sync::Arc;

use tracing::debug;

use crate::domain::backend::Backend;

use super::validators::Validator;

/// Validators evaluated in order; every one must pass
#[derive(Debug, Clone, Default)]
pub struct ValidatorChain {
    validators: Vec<Arc<dyn Validator>>,
}

impl ValidatorChain {
    pub fn new(validators: Vec<Arc<dyn Validator>>) -> Self {
        Self { validators }
    }

    pub fn push(&mut self, validator: Arc<dyn Validator>) {
        self.validators.push(validator);
    }

    pub fn names(&self) -> Vec<&str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Evaluates the chain against `path`, stopping at the first failure
    ///
    /// A validator that errors fails the whole chain; the error is only
    /// logged.
    pub fn is_valid(&self, backend: &dyn Backend, path: &str) -> bool {
        for validator in &self.validators {
            match validator.validate(backend, path) {
                Ok(true) => continue,
                Ok(false) => {
                    debug!(path, validator = validator.name(), "Validator rejected entry");
                    return false;
                }
                Err(e) => {
                    debug!(
                        path,
                        validator = validator.name(),
                        error = %e,
                        "Validator failed with error"
                    );
                    return false;
                }
            }
        }

        true
    }
}
