//! Artifact storage port.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::ArtifactId;

/// Artifact storage scoped to one destination package directory.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Create or replace `name` with `content`.
    async fn write(&self, name: &str, content: &str) -> DomainResult<ArtifactId>;

    /// Current content of `name`, `None` when it does not exist.
    async fn read(&self, name: &str) -> DomainResult<Option<String>>;

    /// Remove `name`; removing a missing artifact is not an error.
    async fn delete(&self, name: &str) -> DomainResult<()>;

    /// Remove every artifact in `names`.
    async fn delete_all(&self, names: &[String]) -> DomainResult<()> {
        for name in names {
            self.delete(name).await?;
        }
        Ok(())
    }

    /// Identity of `name` inside this store, whether or not it exists yet.
    fn locate(&self, name: &str) -> ArtifactId;
}

/// Resolves (creating when needed) the store for a package.
#[async_trait]
pub trait FileStoreProvider: Send + Sync {
    /// `com.acme.billing` maps to `<root>/com/acme/billing`; the empty
    /// package maps to the root itself.
    async fn open_package(&self, package: &str) -> DomainResult<Arc<dyn FileStore>>;
}
