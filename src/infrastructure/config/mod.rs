//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Environment variable overrides
//! - Configuration validation
//! - Prompt template overrides

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, CONFIG_DIR};
