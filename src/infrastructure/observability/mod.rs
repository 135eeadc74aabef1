//! Observability infrastructure - Cache metrics

mod metrics;

pub use metrics::{record_execution, record_lookup, LookupOutcome};
