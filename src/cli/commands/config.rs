//! Implementation of the `testforge config` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;

use crate::cli::load_config;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::oracle::redact_api_key;

#[derive(Args, Debug)]
pub struct ConfigArgs {}

#[derive(Debug, serde::Serialize)]
pub struct ConfigOutput {
    pub config: Config,
}

impl ConfigOutput {
    /// Wrap the effective configuration, masking the API key.
    pub fn new(mut config: Config) -> Self {
        config.oracle.api_key = config
            .oracle
            .resolved_api_key()
            .map(|key| redact_api_key(&key));
        Self { config }
    }
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config).unwrap_or_default()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

pub fn execute(_args: &ConfigArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = load_config(config_path).context("Failed to load configuration")?;
    output(&ConfigOutput::new(config), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_is_redacted() {
        let mut config = Config::default();
        config.oracle.api_key = Some("AIzaSyD-1234567890abcd".to_string());

        let rendered = ConfigOutput::new(config).to_human();
        assert!(rendered.contains("****abcd"));
        assert!(!rendered.contains("1234567890"));
    }

    #[test]
    fn test_env_key_is_shown_redacted() {
        temp_env::with_var("GEMINI_API_KEY", Some("env-key-000011112222"), || {
            let json = ConfigOutput::new(Config::default()).to_json();
            assert_eq!(json["oracle"]["api_key"], "****2222");
        });
    }
}
