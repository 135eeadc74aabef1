//! Signature domain - Mapping call arguments onto formal parameters

mod args;
mod binding;

pub use args::{Arguments, CallArgs};
pub use binding::{Param, ParamKind, Signature};
