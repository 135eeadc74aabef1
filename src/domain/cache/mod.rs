//! Cache domain - Configuration, key derivation and location conventions

mod config;
mod key;
mod location;
mod provider;

pub use config::{CacheConfig, ExpiryMode};
pub use key::{content_hash, tokenize, tokenize_serializable, Codec, JsonCodec};
pub use location::{
    base_path, file_name, history_index, history_path, is_exception_path, is_history_path,
    is_input_path, normalize_prefix, parent_of, FunctionId, KeyForm, RecordKind,
};
pub use provider::{ConfigProvider, ResolvedLocation};
