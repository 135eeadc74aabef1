//! Validator domain - Deciding whether a stored entry is usable

mod chain;
mod validators;

pub use chain::ValidatorChain;
pub use validators::{Exists, FnValidator, Ttl, TtlValidator, Validator};
