use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ArtifactId, CompileOutcome, TestOutcome};

/// Compiles one persisted artifact.
///
/// Failures of the candidate itself come back as a [`CompileOutcome`];
/// `Err` is reserved for the compiler being unusable, which fails the CUT.
#[async_trait]
pub trait CompileService: Send + Sync {
    async fn compile(&self, artifact: &ArtifactId) -> DomainResult<CompileOutcome>;
}

/// Runs a compiled test artifact.
#[async_trait]
pub trait TestExecutionService: Send + Sync {
    async fn run(&self, artifact: &ArtifactId) -> DomainResult<TestOutcome>;
}
