//! Configuration infrastructure - Resolving default storage from settings

mod provider;

pub use provider::{default_cache_config, EnvConfigProvider};
