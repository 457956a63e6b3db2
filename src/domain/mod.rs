//! Domain layer for testforge
//!
//! Models for scenarios, artifacts and reports, plus the port traits the
//! synthesis services are written against.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
