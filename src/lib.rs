//! memokit
//!
//! Function-level memoization onto a pluggable storage backend:
//! - Content-addressed keys derived from the bound argument mapping
//! - Persisted outputs and faults, replayed instead of re-executing
//! - Validator chains with TTL expiry, optionally keeping superseded outputs
//! - Lazy backend resolution from `MEMOKIT__*` settings
//!
//! ```
//! use std::sync::Arc;
//! use memokit::{Arguments, CacheConfig, CallArgs, FunctionId, InMemoryBackend, Memoized, Signature};
//!
//! let config = CacheConfig::new().with_backend(Arc::new(InMemoryBackend::new()));
//! let add = Memoized::new(
//!     FunctionId::new("demo", "add"),
//!     Signature::new().param("a").param("b"),
//!     |args: &Arguments| -> Result<i64, String> {
//!         let a: i64 = args.get("a").map_err(|e| e.to_string())?;
//!         let b: i64 = args.get("b").map_err(|e| e.to_string())?;
//!         Ok(a + b)
//!     },
//!     Arc::new(config),
//! );
//!
//! assert_eq!(add.call(CallArgs::new().arg(1).arg(2)).unwrap(), 3);
//! assert_eq!(add.cache().list(memokit::RecordKind::Output, Default::default()).unwrap().len(), 1);
//! ```

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::Settings;
pub use domain::{
    Arguments, Backend, CacheConfig, CallArgs, CallError, ExpiryMode, FunctionId, KeyForm,
    MemoError, RecordKind, Signature, Ttl, Validator,
};
pub use infrastructure::backend::{BackendFactory, InMemoryBackend, LocalBackend};
pub use infrastructure::config::{default_cache_config, EnvConfigProvider};
pub use infrastructure::logging::init_logging;
pub use infrastructure::services::{CacheManager, EntryRef, Memoized};
