//! Infrastructure services - Record persistence, cache management and the
//! memoized call wrapper

mod cache_manager;
mod memoized;
mod record_store;

pub use cache_manager::{CacheManager, EntryRef};
pub use memoized::Memoized;
pub use record_store::RecordStore;
