//! Glob pattern matching shared by the backends

use globset::{GlobBuilder, GlobMatcher};

use crate::domain::MemoError;

/// Compiles a glob where `*` and `?` never match `/`
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher, MemoError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| MemoError::storage(format!("Invalid glob pattern '{}': {}", pattern, e)))
}

/// Escapes glob syntax so `literal` matches only itself
pub fn escape_literal(literal: &str) -> String {
    globset::escape(literal)
}

/// Reverses [`escape_literal`] for a pattern component used as a real path
///
/// Only the single-character classes produced by escaping are unwrapped.
pub fn unescape_literal(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut literal = String::with_capacity(pattern.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '[' && i + 2 < chars.len() && chars[i + 2] == ']' {
            literal.push(chars[i + 1]);
            i += 3;
        } else {
            literal.push(chars[i]);
            i += 1;
        }
    }

    literal
}
