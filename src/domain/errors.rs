//! Domain errors for the testforge pipeline.

use thiserror::Error;

/// Domain-level errors that can occur while synthesizing tests.
///
/// Recoverable conditions (compile failures, timeouts, abandoned scenarios)
/// are modelled as data, not errors. Anything that ends up here is fatal to
/// the CUT being processed and is reported at the CUT boundary.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Scenario extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Oracle call failed: {0}")]
    OracleFailed(String),

    #[error("Compiler unavailable: {0}")]
    CompilerUnavailable(String),

    #[error("Test runner unavailable: {0}")]
    TestRunnerUnavailable(String),

    #[error("Artifact storage error: {0}")]
    StorageError(String),

    #[error("Cannot determine destination package for {0}")]
    PackageUnresolved(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Short machine-friendly label used in reports.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ExtractionFailed(_) => "extraction_failed",
            Self::OracleFailed(_) => "oracle_failed",
            Self::CompilerUnavailable(_) => "compiler_unavailable",
            Self::TestRunnerUnavailable(_) => "test_runner_unavailable",
            Self::StorageError(_) => "storage_error",
            Self::PackageUnresolved(_) => "package_unresolved",
            Self::ValidationFailed(_) => "validation_failed",
            Self::SerializationError(_) => "serialization_error",
            Self::ExecutionFailed(_) => "execution_failed",
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::StorageError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for DomainError {
    fn from(err: tokio::task::JoinError) -> Self {
        DomainError::ExecutionFailed(err.to_string())
    }
}
