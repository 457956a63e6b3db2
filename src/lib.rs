//! Testforge - compiler-checked unit test synthesis
//!
//! Testforge asks a code generation oracle for unit tests of a class under
//! test (CUT), compiles every candidate, and feeds compiler diagnostics back
//! into the next request until the candidate compiles or its attempt budget
//! is spent. Accepted per-scenario test classes are then merged into one
//! final test class per CUT.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits
//! - **Service Layer** (`services`): extraction, synthesis rounds,
//!   aggregation and the bulk scheduler
//! - **Infrastructure Layer** (`infrastructure`): Gemini client, process
//!   compiler, file stores, source index, configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use testforge::cli::commands::generate::build_pipeline;
//! use testforge::infrastructure::fs::LocalFileStoreProvider;
//! use testforge::{ConfigLoader, GenerationScheduler, SilentProgress};
//!
//! let config = ConfigLoader::load()?;
//! let pipeline = build_pipeline(&config, oracle);
//! let scheduler = GenerationScheduler::new(
//!     Arc::new(pipeline),
//!     Arc::new(LocalFileStoreProvider::new("src/test/java")),
//! );
//! let report = scheduler.run(&cuts, &SilentProgress::new()).await;
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    BulkReport, BulkStatus, ClassUnderTest, CompileOutcome, Config, CutOutcome, CutReport,
    OracleRequest, OracleResponse, PromptKind, ScenarioStatus, TestOutcome, TestScenario,
};
pub use domain::ports::{
    CodeGenerationOracle, CompileService, FileStore, FileStoreProvider, ProgressReporter,
    SilentProgress, SourceIndex, TestExecutionService,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AggregationSynthesizer, CutPipeline, GenerationScheduler, ScenarioExtractor,
    ScenarioSynthesizer, SynthesisLimits,
};
