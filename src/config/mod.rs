//! Process-wide settings

mod app_config;

pub use app_config::{ENV_PREFIX, FsSettings, LogFormat, LoggingConfig, Settings};
