//! Compiler and test runner that shell out to external tools.
//!
//! Both adapters serialize their invocations: only one compile (or test run)
//! is in flight per adapter at a time, which keeps shared output directories
//! consistent.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ArtifactId, CompileOutcome, CompilerConfig, TestOutcome, TestRunnerConfig};
use crate::domain::ports::{CompileService, TestExecutionService};

#[cfg(windows)]
const CLASSPATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const CLASSPATH_SEPARATOR: &str = ":";

/// Runs the configured compiler on one source file.
pub struct ProcessCompiler {
    config: CompilerConfig,
    lock: Mutex<()>,
}

impl ProcessCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    /// Output directory followed by the configured classpath entries.
    pub fn classpath(&self) -> String {
        classpath(&self.config.output_dir, &self.config.classpath)
    }

    fn build_command(&self, source: &Path) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .arg("-d")
            .arg(&self.config.output_dir)
            .arg("-cp")
            .arg(self.classpath())
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CompileService for ProcessCompiler {
    #[instrument(skip(self), fields(artifact = %artifact.name))]
    async fn compile(&self, artifact: &ArtifactId) -> DomainResult<CompileOutcome> {
        let _guard = self.lock.lock().await;

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|e| {
                DomainError::CompilerUnavailable(format!(
                    "cannot create output directory {}: {e}",
                    self.config.output_dir.display()
                ))
            })?;

        let child = self.build_command(&artifact.path).spawn().map_err(|e| {
            DomainError::CompilerUnavailable(format!(
                "failed to start '{}': {e}",
                self.config.command
            ))
        })?;

        let limit = Duration::from_secs(self.config.timeout_secs);
        let Ok(output) = timeout(limit, child.wait_with_output()).await else {
            warn!(timeout_secs = self.config.timeout_secs, "Compilation timed out");
            return Ok(CompileOutcome::Timeout);
        };
        let output = output.map_err(|e| {
            DomainError::CompilerUnavailable(format!("failed to wait for compiler: {e}"))
        })?;

        let outcome = compile_outcome(&output);
        debug!(ok = outcome.is_ok(), "Compilation finished");
        Ok(outcome)
    }
}

fn compile_outcome(output: &Output) -> CompileOutcome {
    if output.status.success() {
        return CompileOutcome::Ok;
    }
    if output.status.code().is_none() {
        return CompileOutcome::Interrupted;
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut messages = parse_diagnostics(&stderr);
    if messages.is_empty() {
        messages = parse_diagnostics(&stdout);
    }
    if messages.is_empty() {
        let raw = stderr.trim();
        if raw.is_empty() {
            return CompileOutcome::Aborted;
        }
        messages.push(raw.to_string());
    }
    CompileOutcome::Failed(messages)
}

/// Split compiler output into one message per diagnostic.
///
/// A diagnostic starts at a `file:line: error:` (or `warning:`) header and
/// absorbs the indented source excerpt that follows. Trailing summaries such
/// as `2 errors` are dropped.
pub fn parse_diagnostics(output: &str) -> Vec<String> {
    let mut messages: Vec<String> = Vec::new();
    for line in output.lines() {
        if line.trim().is_empty() || is_summary_line(line) {
            continue;
        }
        if line.contains(": error:") || line.contains(": warning:") {
            messages.push(line.trim_end().to_string());
        } else if let Some(current) = messages.last_mut() {
            current.push('\n');
            current.push_str(line.trim_end());
        }
    }
    messages
}

fn is_summary_line(line: &str) -> bool {
    let mut words = line.split_whitespace();
    matches!(
        (words.next(), words.next(), words.next()),
        (Some(n), Some("error" | "errors" | "warning" | "warnings"), None)
            if n.chars().all(|c| c.is_ascii_digit())
    )
}

fn classpath(output_dir: &Path, entries: &[String]) -> String {
    std::iter::once(output_dir.to_string_lossy().into_owned())
        .chain(entries.iter().cloned())
        .collect::<Vec<_>>()
        .join(CLASSPATH_SEPARATOR)
}

/// Runs a compiled test class with the configured launcher.
pub struct ProcessTestRunner {
    config: TestRunnerConfig,
    classpath: String,
    working_dir: Option<PathBuf>,
    lock: Mutex<()>,
}

impl ProcessTestRunner {
    /// `classpath` replaces `{classpath}` in the configured arguments.
    pub fn new(config: TestRunnerConfig, classpath: impl Into<String>) -> Self {
        Self {
            config,
            classpath: classpath.into(),
            working_dir: None,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn expand_args(&self, class: &str) -> Vec<String> {
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{class}", class)
                    .replace("{classpath}", &self.classpath)
            })
            .collect()
    }
}

#[async_trait]
impl TestExecutionService for ProcessTestRunner {
    #[instrument(skip(self), fields(artifact = %artifact.name))]
    async fn run(&self, artifact: &ArtifactId) -> DomainResult<TestOutcome> {
        let _guard = self.lock.lock().await;

        let mut cmd = Command::new(&self.config.command);
        cmd.args(self.expand_args(&artifact.qualified_name()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| {
            DomainError::TestRunnerUnavailable(format!(
                "failed to start '{}': {e}",
                self.config.command
            ))
        })?;

        let limit = Duration::from_secs(self.config.timeout_secs);
        let Ok(output) = timeout(limit, child.wait_with_output()).await else {
            warn!(timeout_secs = self.config.timeout_secs, "Test run timed out");
            return Ok(TestOutcome::Failed(format!(
                "TEST_TIMEOUT after {}s",
                self.config.timeout_secs
            )));
        };
        let output = output.map_err(|e| {
            DomainError::TestRunnerUnavailable(format!("failed to wait for test runner: {e}"))
        })?;

        if output.status.success() {
            return Ok(TestOutcome::Ok);
        }
        let mut console = String::from_utf8_lossy(&output.stdout).into_owned();
        console.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(TestOutcome::Failed(console))
    }
}
