use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Best-effort lookup of another unit's source by logical name.
///
/// Identifiers are whatever the oracle asked for: usually a fully qualified
/// class name, sometimes a relative path.
#[async_trait]
pub trait SourceIndex: Send + Sync {
    async fn resolve(&self, identifier: &str) -> DomainResult<Option<String>>;
}
