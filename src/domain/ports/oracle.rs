//! Oracle port - interface for code generation backends.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{OracleRequest, OracleResponse};

/// A text generation backend that turns prompt context into source code.
///
/// Implementations must tolerate being called repeatedly with nearly
/// identical context, and concurrently from several tasks of one round.
#[async_trait]
pub trait CodeGenerationOracle: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Run one generation.
    ///
    /// For [`PromptKind::Scenarios`](crate::domain::models::PromptKind) the
    /// response text is the raw JSON scenario list.
    async fn generate(&self, request: OracleRequest) -> DomainResult<OracleResponse>;
}
