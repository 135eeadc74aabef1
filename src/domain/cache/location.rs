//! Storage location conventions

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static HISTORY_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-(\d+)$").unwrap());

/// Stable identity of a memoized function
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionId {
    module: String,
    name: String,
}

impl FunctionId {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `module.name`, with Rust path separators rendered as `.`
    pub fn qualified_name(&self) -> String {
        let module = self.module.replace("::", ".");
        if module.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", module, self.name)
        }
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Builds a [`FunctionId`] for a function in the calling module
#[macro_export]
macro_rules! function_id {
    ($name:ident) => {
        $crate::domain::cache::FunctionId::new(module_path!(), stringify!($name))
    };
}

/// Kinds of records persisted for one cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Serialized argument mapping, `key.inputs`
    Inputs,
    /// Serialized return value, bare `key`
    Output,
    /// Serialized fault, `key.exc`
    Exception,
}

impl RecordKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Inputs => ".inputs",
            Self::Output => "",
            Self::Exception => ".exc",
        }
    }

    /// Path of this record for `key` under `base`
    pub fn path(&self, base: &str, key: &str) -> String {
        format!("{}/{}{}", base, key, self.suffix())
    }

    /// Whether a file name belongs to this record kind
    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            Self::Inputs | Self::Exception => file_name.ends_with(self.suffix()),
            Self::Output => !is_input_path(file_name) && !is_exception_path(file_name),
        }
    }

    /// Strips this kind's suffix from a file name
    pub fn key_of<'a>(&self, file_name: &'a str) -> &'a str {
        file_name.strip_suffix(self.suffix()).unwrap_or(file_name)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inputs => write!(f, "inputs"),
            Self::Output => write!(f, "output"),
            Self::Exception => write!(f, "exception"),
        }
    }
}

/// Form of the items produced by a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyForm {
    /// Bare cache keys
    #[default]
    Key,
    /// Full backend paths
    Path,
}

pub fn is_input_path(path: &str) -> bool {
    path.ends_with(RecordKind::Inputs.suffix())
}

pub fn is_exception_path(path: &str) -> bool {
    path.ends_with(RecordKind::Exception.suffix())
}

/// Whether a name carries an append-mode history suffix (`key-N`)
pub fn is_history_path(path: &str) -> bool {
    HISTORY_SUFFIX.is_match(file_name(path))
}

/// History index of `path` relative to the bare `entry` path
///
/// `entry` itself is index 0 and `entry-N` is index N; anything else is not
/// part of the entry's history.
pub fn history_index(entry: &str, path: &str) -> Option<usize> {
    if path == entry {
        return Some(0);
    }

    let suffix = path.strip_prefix(entry)?.strip_prefix('-')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    suffix.parse().ok()
}

/// Path of history version `version` of `entry`
pub fn history_path(entry: &str, version: usize) -> String {
    if version == 0 {
        entry.to_string()
    } else {
        format!("{}-{}", entry, version)
    }
}

/// Last `/`-separated component of a path
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Parent of a `/`-separated path, if it has one
pub fn parent_of(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Removes trailing separators from a configured prefix
///
/// The root prefix `/` is kept as is.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() && prefix.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Base directory of a function's records
pub fn base_path(function: &FunctionId, prefix: Option<&str>) -> String {
    let name = function.qualified_name();

    match prefix.map(normalize_prefix) {
        Some(prefix) if prefix == "/" => format!("/{}", name),
        Some(prefix) if !prefix.is_empty() => format!("{}/{}", prefix, name),
        _ => name,
    }
}
