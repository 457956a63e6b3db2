//! Infrastructure layer module
//!
//! Adapters that satisfy the domain ports:
//! - Gemini oracle client
//! - Process compiler and test runner
//! - Filesystem and in-memory artifact stores
//! - Source index and CUT discovery
//! - Configuration loading and logging

pub mod compiler;
pub mod config;
pub mod fs;
pub mod logging;
pub mod oracle;
pub mod source_index;
