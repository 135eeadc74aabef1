use std::collections::HashMap;

use serde::Deserialize;

/// Process-wide settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub fs: FsSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default storage location for memoized functions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FsSettings {
    /// Backend protocol (`memory`, `file`); unset means not configured
    #[serde(default)]
    pub protocol: Option<String>,
    /// Backend specific options, e.g. `root` for the `file` backend
    #[serde(default)]
    pub storage_options: HashMap<String, String>,
    /// Path prefix placed before every function directory
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Prefix of the environment variables read by [`Settings::load`]
pub const ENV_PREFIX: &str = "MEMOKIT";

impl Settings {
    /// Loads settings from `memokit.*` files and `MEMOKIT__*` variables
    ///
    /// Nested keys use a double underscore, e.g. `MEMOKIT__FS__PROTOCOL`.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::build(None)
    }

    /// Loads settings from an explicit variable map instead of the process
    /// environment
    pub fn from_env_map(vars: HashMap<String, String>) -> Result<Self, config::ConfigError> {
        Self::build(Some(vars))
    }

    fn build(vars: Option<HashMap<String, String>>) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("memokit").required(false))
            .add_source(config::File::with_name("memokit.local").required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let settings = Settings::from_env_map(HashMap::new()).unwrap();

        assert!(settings.fs.protocol.is_none());
        assert!(settings.fs.prefix.is_none());
        assert!(settings.fs.storage_options.is_empty());
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_nested_env_keys() {
        let settings = Settings::from_env_map(vars(&[
            ("MEMOKIT__FS__PROTOCOL", "file"),
            ("MEMOKIT__FS__PREFIX", "cache/"),
            ("MEMOKIT__FS__STORAGE_OPTIONS__ROOT", "/var/tmp"),
            ("MEMOKIT__LOGGING__LEVEL", "debug"),
            ("MEMOKIT__LOGGING__FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(settings.fs.protocol.as_deref(), Some("file"));
        assert_eq!(settings.fs.prefix.as_deref(), Some("cache/"));
        assert_eq!(
            settings.fs.storage_options.get("root").map(String::as_str),
            Some("/var/tmp")
        );
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_unrelated_variables_ignored() {
        let settings = Settings::from_env_map(vars(&[("OTHER__FS__PROTOCOL", "memory")])).unwrap();
        assert!(settings.fs.protocol.is_none());
    }
}
