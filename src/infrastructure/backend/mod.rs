//! Backend infrastructure - Storage backend implementations

mod factory;
mod in_memory;
mod local;
mod pattern;

pub use factory::{BackendFactory, BackendType};
pub use in_memory::InMemoryBackend;
pub use local::LocalBackend;
pub use pattern::escape_literal;
