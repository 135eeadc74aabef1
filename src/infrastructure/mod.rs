//! Infrastructure layer - Backends, settings-driven configuration and services

pub mod backend;
pub mod config;
pub mod logging;
pub mod observability;
pub mod services;
