use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::domain::models::{PromptKind, PromptLibrary, PromptTemplate, PromptsConfig};

/// Directory holding project configuration, relative to the project root
pub const CONFIG_DIR: &str = ".testforge";

const MAX_CONCURRENCY: usize = 64;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_attempts: {0}. Must be at least 1")]
    InvalidMaxAttempts(u32),

    #[error("Invalid aggregation_max_attempts: {0}. Must be at least 1")]
    InvalidAggregationAttempts(u32),

    #[error("Invalid max_concurrency: {0}. Must be between 1 and {MAX_CONCURRENCY}")]
    InvalidConcurrency(usize),

    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid {0} timeout: must be at least 1 second")]
    ZeroTimeout(&'static str),

    #[error("Compiler command cannot be empty")]
    EmptyCompilerCommand,

    #[error("At least one source root must be configured")]
    NoSourceRoots,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Cannot read prompt template {path}: {source}")]
    PromptTemplate {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the project in the current directory
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .testforge/config.yaml (project config, created by init)
    /// 3. .testforge/local.yaml (local overrides, optional)
    /// 4. Environment variables (TESTFORGE_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(Path::new("."))
    }

    /// Same as [`ConfigLoader::load`] with an explicit project root
    pub fn load_from_dir(root: &Path) -> Result<Config> {
        let dir = root.join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed("TESTFORGE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("TESTFORGE_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let pipeline = &config.pipeline;
        if pipeline.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(pipeline.max_attempts));
        }
        if pipeline.aggregation_max_attempts == 0 {
            return Err(ConfigError::InvalidAggregationAttempts(
                pipeline.aggregation_max_attempts,
            ));
        }
        if pipeline.max_concurrency == 0 || pipeline.max_concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::InvalidConcurrency(pipeline.max_concurrency));
        }

        let oracle = &config.oracle;
        if oracle.rate_limit_rps <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(oracle.rate_limit_rps));
        }
        if oracle.initial_backoff_ms >= oracle.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                oracle.initial_backoff_ms,
                oracle.max_backoff_ms,
            ));
        }
        if oracle.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("oracle"));
        }

        if config.compiler.command.trim().is_empty() {
            return Err(ConfigError::EmptyCompilerCommand);
        }
        if config.compiler.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("compiler"));
        }
        if config.test_runner.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("test runner"));
        }

        if config.project.source_roots.is_empty() {
            return Err(ConfigError::NoSourceRoots);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }

    /// Build the prompt library, reading any configured template overrides
    pub fn prompt_library(prompts: &PromptsConfig) -> Result<PromptLibrary, ConfigError> {
        let mut library = PromptLibrary::default();
        for kind in PromptKind::ALL {
            if let Some(path) = prompts.path_for(kind) {
                let text =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::PromptTemplate {
                        path: path.display().to_string(),
                        source,
                    })?;
                library = library.with_template(kind, PromptTemplate::new(text));
            }
        }
        Ok(library)
    }
}
