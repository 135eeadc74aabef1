//! Backend domain - Storage capability consumed by the cache engine

mod repository;

pub use repository::Backend;

#[cfg(test)]
pub use repository::MockBackend;
