//! Implementation of the `testforge init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, PromptKind};
use crate::infrastructure::config::CONFIG_DIR;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration
    #[arg(long, short)]
    pub force: bool,

    /// Project directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_path: PathBuf,
    pub prompts_written: Vec<String>,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.success {
            lines.push(format!("\nConfiguration: {}", self.config_path.display()));
        }
        if !self.prompts_written.is_empty() {
            lines.push("\nPrompt templates:".to_string());
            for prompt in &self.prompts_written {
                lines.push(format!("  - {prompt}"));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };
    let result = initialize(&target_path, args.force).await?;
    output(&result, json_mode);
    Ok(())
}

/// Write `.testforge/config.yaml` and editable copies of the built-in prompts.
pub async fn initialize(target_path: &Path, force: bool) -> Result<InitOutput> {
    let config_dir = target_path.join(CONFIG_DIR);
    let config_path = config_dir.join("config.yaml");

    if config_path.exists() && !force {
        return Ok(InitOutput {
            success: false,
            message: "Project already initialized. Use --force to overwrite.".to_string(),
            config_path,
            prompts_written: vec![],
        });
    }

    let prompts_dir = config_dir.join("prompts");
    fs::create_dir_all(&prompts_dir)
        .await
        .with_context(|| format!("Failed to create {}", prompts_dir.display()))?;

    let mut config = Config::default();
    let mut prompts_written = Vec::new();
    for kind in PromptKind::ALL {
        let file_name = format!("{}.txt", kind.as_str());
        let absolute = prompts_dir.join(&file_name);
        if force || !absolute.exists() {
            fs::write(&absolute, kind.default_template())
                .await
                .with_context(|| format!("Failed to write {}", absolute.display()))?;
            prompts_written.push(file_name.clone());
        }
        let relative = PathBuf::from(CONFIG_DIR).join("prompts").join(&file_name);
        match kind {
            PromptKind::Scenarios => config.prompts.scenarios = Some(relative),
            PromptKind::SingleTest => config.prompts.single_test = Some(relative),
            PromptKind::AggregateTestClass => config.prompts.aggregate = Some(relative),
        }
    }

    let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
    fs::write(&config_path, yaml)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    Ok(InitOutput {
        success: true,
        message: if force {
            "Project reinitialized successfully.".to_string()
        } else {
            "Project initialized successfully.".to_string()
        },
        config_path,
        prompts_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::ConfigLoader;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_writes_loadable_config() {
        let temp = TempDir::new().unwrap();

        let result = initialize(temp.path(), false).await.unwrap();
        assert!(result.success);
        assert_eq!(result.prompts_written.len(), 3);

        let config = ConfigLoader::load_from_file(&result.config_path).unwrap();
        assert_eq!(config.pipeline.max_attempts, 10);
        assert!(config.prompts.single_test.is_some());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        initialize(temp.path(), false).await.unwrap();

        let again = initialize(temp.path(), false).await.unwrap();
        assert!(!again.success);

        let forced = initialize(temp.path(), true).await.unwrap();
        assert!(forced.success);
        assert_eq!(forced.prompts_written.len(), 3);
    }

    #[tokio::test]
    async fn test_init_keeps_edited_prompts() {
        let temp = TempDir::new().unwrap();
        let prompt = temp
            .path()
            .join(CONFIG_DIR)
            .join("prompts")
            .join("get-single-test-prompt.txt");
        std::fs::create_dir_all(prompt.parent().unwrap()).unwrap();
        std::fs::write(&prompt, "custom").unwrap();

        let result = initialize(temp.path(), false).await.unwrap();
        assert_eq!(result.prompts_written.len(), 2);
        assert_eq!(std::fs::read_to_string(prompt).unwrap(), "custom");
    }
}
