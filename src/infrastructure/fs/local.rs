use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ArtifactId;
use crate::domain::ports::{FileStore, FileStoreProvider};

/// Artifacts stored as files in one package directory.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    package: String,
    dir: PathBuf,
}

impl LocalFileStore {
    pub fn new(package: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            package: package.into(),
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> DomainResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(name))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn write(&self, name: &str, content: &str) -> DomainResult<ArtifactId> {
        let path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, content).await?;
        debug!(path = %path.display(), bytes = content.len(), "Artifact written");
        Ok(ArtifactId::new(&self.package, name, path))
    }

    async fn read(&self, name: &str) -> DomainResult<Option<String>> {
        let path = self.path_for(name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, name: &str) -> DomainResult<()> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Artifact deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn locate(&self, name: &str) -> ArtifactId {
        ArtifactId::new(&self.package, name, self.dir.join(name))
    }
}

/// Opens package directories below a destination root.
#[derive(Debug, Clone)]
pub struct LocalFileStoreProvider {
    root: PathBuf,
}

impl LocalFileStoreProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FileStoreProvider for LocalFileStoreProvider {
    async fn open_package(&self, package: &str) -> DomainResult<Arc<dyn FileStore>> {
        let dir = package_dir(&self.root, package)?;
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            DomainError::StorageError(format!("cannot create {}: {e}", dir.display()))
        })?;
        Ok(Arc::new(LocalFileStore::new(package, dir)))
    }
}

/// `root/com/acme` for `com.acme`; the root itself for the default package.
pub fn package_dir(root: &Path, package: &str) -> DomainResult<PathBuf> {
    if package.is_empty() {
        return Ok(root.to_path_buf());
    }
    let mut dir = root.to_path_buf();
    for segment in package.split('.') {
        let valid = segment
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
            && segment.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
        if !valid {
            return Err(DomainError::PackageUnresolved(package.to_string()));
        }
        dir.push(segment);
    }
    Ok(dir)
}

pub(super) fn validate_name(name: &str) -> DomainResult<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(DomainError::StorageError(format!(
            "invalid artifact name '{name}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_package_directory_is_created() {
        let temp = TempDir::new().unwrap();
        let provider = LocalFileStoreProvider::new(temp.path());

        let store = provider.open_package("com.acme.billing").await.unwrap();
        let id = store.write("InvoiceTest.java", "class InvoiceTest {}").await.unwrap();

        let expected = temp.path().join("com/acme/billing/InvoiceTest.java");
        assert_eq!(id.path, expected);
        assert_eq!(id.qualified_name(), "com.acme.billing.InvoiceTest");
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "class InvoiceTest {}");
    }

    #[tokio::test]
    async fn test_default_package_uses_root() {
        let temp = TempDir::new().unwrap();
        let provider = LocalFileStoreProvider::new(temp.path());

        let store = provider.open_package("").await.unwrap();
        assert_eq!(store.locate("ATest.java").path, temp.path().join("ATest.java"));
    }

    #[tokio::test]
    async fn test_overwrite_read_and_delete() {
        let temp = TempDir::new().unwrap();
        let store = LocalFileStore::new("a", temp.path());

        store.write("T.java", "one").await.unwrap();
        store.write("T.java", "two").await.unwrap();
        assert_eq!(store.read("T.java").await.unwrap().as_deref(), Some("two"));

        store.delete("T.java").await.unwrap();
        assert_eq!(store.read("T.java").await.unwrap(), None);
        // Deleting again is fine.
        store.delete("T.java").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_escape() {
        let temp = TempDir::new().unwrap();
        let store = LocalFileStore::new("a", temp.path());
        assert!(store.write("../evil.java", "x").await.is_err());
    }

    #[test]
    fn test_invalid_package_is_unresolved() {
        let err = package_dir(Path::new("/out"), "com..acme").unwrap_err();
        assert!(matches!(err, DomainError::PackageUnresolved(_)));
        assert!(package_dir(Path::new("/out"), "com.1acme").is_err());
    }
}
