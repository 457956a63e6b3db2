pub mod aggregation;
pub mod artifact;
pub mod config;
pub mod cut;
pub mod oracle;
pub mod prompt;
pub mod report;
pub mod scenario;

pub use aggregation::{AggregationOutcome, AggregationReport, AggregationState};
pub use artifact::{ArtifactId, CompileOutcome, TestOutcome};
pub use config::{
    CompilerConfig, Config, LoggingConfig, OracleConfig, PipelineConfig, ProjectConfig,
    PromptsConfig, TestRunnerConfig,
};
pub use cut::{parse_package, ClassUnderTest};
pub use oracle::{strip_code_fences, OracleRequest, OracleResponse};
pub use prompt::{
    placeholders, render, render_list, PromptContext, PromptKind, PromptLibrary, PromptTemplate,
};
pub use report::{BulkReport, BulkStatus, CutOutcome, CutReport, SynthesisReport};
pub use scenario::{ScenarioList, ScenarioState, ScenarioStatus, TestScenario};
