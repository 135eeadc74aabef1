//! Domain layer - Core memoization concepts

pub mod backend;
pub mod cache;
pub mod error;
pub mod signature;
pub mod validator;

pub use backend::Backend;
pub use cache::{CacheConfig, ExpiryMode, FunctionId, KeyForm, RecordKind};
pub use error::{CallError, MemoError};
pub use signature::{Arguments, CallArgs, Signature};
pub use validator::{Ttl, Validator};
