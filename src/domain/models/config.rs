use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::prompt::PromptKind;

/// Main configuration structure for testforge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Code generation oracle configuration
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Generate/compile/retry pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Compiler invocation
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Optional test execution after a clean aggregate compile
    #[serde(default)]
    pub test_runner: TestRunnerConfig,

    /// Source and destination layout
    #[serde(default)]
    pub project: ProjectConfig,

    /// Prompt template overrides
    #[serde(default)]
    pub prompts: PromptsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Oracle (LLM) client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OracleConfig {
    /// API key (falls back to the GEMINI_API_KEY environment variable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the generateContent API
    #[serde(default = "default_oracle_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_oracle_model")]
    pub model: String,

    /// Overall per-call timeout in seconds
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,

    /// Requests per second allowed across all concurrent generations
    #[serde(default = "default_requests_per_second")]
    pub rate_limit_rps: f64,

    /// Retries for transient HTTP failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_oracle_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_oracle_model() -> String {
    "gemini-2.5-flash".to_string()
}

const fn default_oracle_timeout() -> u64 {
    180
}

const fn default_requests_per_second() -> f64 {
    5.0
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    2_000
}

const fn default_max_backoff_ms() -> u64 {
    60_000
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_oracle_base_url(),
            model: default_oracle_model(),
            timeout_secs: default_oracle_timeout(),
            rate_limit_rps: default_requests_per_second(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl OracleConfig {
    /// Get API key from config or environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Retry and concurrency budget of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Oracle generations allowed per scenario
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Oracle calls allowed for the final merge
    #[serde(default = "default_max_attempts")]
    pub aggregation_max_attempts: u32,

    /// Concurrent oracle calls within a round
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Infix of per-scenario temp artifacts: `<Cut><suffix><index>`
    #[serde(default = "default_temp_suffix")]
    pub temp_suffix: String,

    /// Suffix of the final artifact: `<Cut><suffix>`
    #[serde(default = "default_test_suffix")]
    pub test_suffix: String,

    /// Extension of generated artifacts, without the dot
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Run the final artifact after a clean compile
    #[serde(default)]
    pub run_tests: bool,
}

const fn default_max_attempts() -> u32 {
    10
}

const fn default_max_concurrency() -> usize {
    8
}

fn default_temp_suffix() -> String {
    "TmpTest".to_string()
}

fn default_test_suffix() -> String {
    "Test".to_string()
}

fn default_file_extension() -> String {
    "java".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            aggregation_max_attempts: default_max_attempts(),
            max_concurrency: default_max_concurrency(),
            temp_suffix: default_temp_suffix(),
            test_suffix: default_test_suffix(),
            file_extension: default_file_extension(),
            run_tests: false,
        }
    }
}

impl PipelineConfig {
    /// Temp artifact name for scenario `index` of `cut_name`.
    pub fn temp_artifact_name(&self, cut_name: &str, index: usize) -> String {
        format!("{cut_name}{}{index}.{}", self.temp_suffix, self.file_extension)
    }

    /// Final artifact name for `cut_name`.
    pub fn final_artifact_name(&self, cut_name: &str) -> String {
        format!("{cut_name}{}.{}", self.test_suffix, self.file_extension)
    }
}

/// External compiler invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompilerConfig {
    /// Compiler executable
    #[serde(default = "default_compiler_command")]
    pub command: String,

    /// Extra arguments placed before the source file
    #[serde(default)]
    pub args: Vec<String>,

    /// Classpath entries joined with the platform separator
    #[serde(default)]
    pub classpath: Vec<String>,

    /// Directory for compiler output
    #[serde(default = "default_compiler_output_dir")]
    pub output_dir: PathBuf,

    /// Per-compile timeout in seconds
    #[serde(default = "default_compile_timeout")]
    pub timeout_secs: u64,
}

fn default_compiler_command() -> String {
    "javac".to_string()
}

fn default_compiler_output_dir() -> PathBuf {
    PathBuf::from(".testforge/classes")
}

const fn default_compile_timeout() -> u64 {
    60
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            command: default_compiler_command(),
            args: Vec::new(),
            classpath: Vec::new(),
            output_dir: default_compiler_output_dir(),
            timeout_secs: default_compile_timeout(),
        }
    }
}

/// External test runner invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TestRunnerConfig {
    /// Runner executable
    #[serde(default = "default_runner_command")]
    pub command: String,

    /// Arguments; `{class}` is replaced by the test's qualified name
    #[serde(default = "default_runner_args")]
    pub args: Vec<String>,

    /// Per-run timeout in seconds
    #[serde(default = "default_runner_timeout")]
    pub timeout_secs: u64,
}

fn default_runner_command() -> String {
    "java".to_string()
}

fn default_runner_args() -> Vec<String> {
    vec![
        "-jar".to_string(),
        "junit-platform-console-standalone.jar".to_string(),
        "--select-class".to_string(),
        "{class}".to_string(),
    ]
}

const fn default_runner_timeout() -> u64 {
    300
}

impl Default for TestRunnerConfig {
    fn default() -> Self {
        Self {
            command: default_runner_command(),
            args: default_runner_args(),
            timeout_secs: default_runner_timeout(),
        }
    }
}

/// Source roots and destination root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProjectConfig {
    /// Roots searched for CUTs, namespaces and context classes
    #[serde(default = "default_source_roots")]
    pub source_roots: Vec<PathBuf>,

    /// Destination root; generated tests mirror the CUT's package below it
    #[serde(default = "default_test_root")]
    pub test_root: PathBuf,
}

fn default_source_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("src/main/java")]
}

fn default_test_root() -> PathBuf {
    PathBuf::from("src/test/java")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            source_roots: default_source_roots(),
            test_root: default_test_root(),
        }
    }
}

/// Template files replacing the built-in prompts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PromptsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_test: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<PathBuf>,
}

impl PromptsConfig {
    pub fn path_for(&self, kind: PromptKind) -> Option<&PathBuf> {
        match kind {
            PromptKind::Scenarios => self.scenarios.as_ref(),
            PromptKind::SingleTest => self.single_test.as_ref(),
            PromptKind::AggregateTestClass => self.aggregate.as_ref(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Also log to stderr when a log directory is set
    #[serde(default = "default_true")]
    pub enable_stdout: bool,

    /// Rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,

    /// Number of days to retain logs
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_rotation() -> String {
    "daily".to_string()
}

const fn default_retention_days() -> u32 {
    14
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            enable_stdout: default_true(),
            rotation: default_rotation(),
            retention_days: default_retention_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.temp_artifact_name("Invoice", 2), "InvoiceTmpTest2.java");
        assert_eq!(pipeline.final_artifact_name("Invoice"), "InvoiceTest.java");
    }

    #[test]
    fn test_resolved_api_key_prefers_config() {
        let config = OracleConfig {
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };
        temp_env::with_var("GEMINI_API_KEY", Some("from-env"), || {
            assert_eq!(config.resolved_api_key().as_deref(), Some("from-config"));
        });
    }

    #[test]
    fn test_resolved_api_key_falls_back_to_env() {
        let config = OracleConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        temp_env::with_var("GEMINI_API_KEY", Some("from-env"), || {
            assert_eq!(config.resolved_api_key().as_deref(), Some("from-env"));
        });
        temp_env::with_var_unset("GEMINI_API_KEY", || {
            assert_eq!(config.resolved_api_key(), None);
        });
    }

    #[test]
    fn test_prompt_override_lookup() {
        let prompts = PromptsConfig {
            single_test: Some(PathBuf::from("prompts/single.txt")),
            ..Default::default()
        };
        assert!(prompts.path_for(PromptKind::Scenarios).is_none());
        assert_eq!(
            prompts.path_for(PromptKind::SingleTest),
            Some(&PathBuf::from("prompts/single.txt"))
        );
    }
}
