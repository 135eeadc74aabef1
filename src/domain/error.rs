use thiserror::Error;

/// Core engine errors
#[derive(Debug, Error)]
pub enum MemoError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Contract violation: {message}")]
    ContractViolation { message: String },

    #[error("Binding error: {message}")]
    Binding { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl MemoError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn contract_violation(message: impl Into<String>) -> Self {
        Self::ContractViolation {
            message: message.into(),
        }
    }

    pub fn binding(message: impl Into<String>) -> Self {
        Self::Binding {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns true for errors raised because a record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for MemoError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Outcome of a memoized call that did not produce a value
///
/// `Function` carries the wrapped function's own fault, whether it was raised
/// by this invocation or replayed from an exception record. `Cache` carries
/// faults of the engine itself (binding, backend, codec, configuration).
#[derive(Debug, Error)]
pub enum CallError<E> {
    #[error("{0}")]
    Function(E),

    #[error(transparent)]
    Cache(#[from] MemoError),
}

impl<E> CallError<E> {
    /// Returns the wrapped function's fault, if this is one
    pub fn function_error(&self) -> Option<&E> {
        match self {
            Self::Function(err) => Some(err),
            Self::Cache(_) => None,
        }
    }

    /// Converts into the wrapped function's fault, if this is one
    pub fn into_function_error(self) -> Option<E> {
        match self {
            Self::Function(err) => Some(err),
            Self::Cache(_) => None,
        }
    }

    pub fn is_cache_error(&self) -> bool {
        matches!(self, Self::Cache(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = MemoError::not_found("demo.add/abc");
        assert_eq!(error.to_string(), "Not found: demo.add/abc");
        assert!(error.is_not_found());
    }

    #[test]
    fn test_contract_violation_error() {
        let error = MemoError::contract_violation("variadic positional parameter `args`");
        assert_eq!(
            error.to_string(),
            "Contract violation: variadic positional parameter `args`"
        );
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_serde_json_error_converts_to_serialization() {
        let err = serde_json::from_str::<i32>("not json").unwrap_err();
        let error: MemoError = err.into();
        assert!(matches!(error, MemoError::Serialization { .. }));
    }

    #[test]
    fn test_call_error_function_display() {
        let error: CallError<String> = CallError::Function("boom".to_string());
        assert_eq!(error.to_string(), "boom");
        assert_eq!(error.function_error(), Some(&"boom".to_string()));
        assert!(!error.is_cache_error());
    }

    #[test]
    fn test_call_error_from_memo_error() {
        let error: CallError<String> = MemoError::storage("disk full").into();
        assert!(error.is_cache_error());
        assert_eq!(error.to_string(), "Storage error: disk full");
        assert!(error.into_function_error().is_none());
    }
}
