use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::local::{package_dir, validate_name};
use crate::domain::errors::DomainResult;
use crate::domain::models::ArtifactId;
use crate::domain::ports::{FileStore, FileStoreProvider};

/// In-memory artifact store, used for dry runs and tests.
#[derive(Debug)]
pub struct InMemoryFileStore {
    package: String,
    dir: PathBuf,
    files: RwLock<BTreeMap<String, String>>,
}

impl InMemoryFileStore {
    pub fn new(package: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            package: package.into(),
            dir: dir.into(),
            files: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn get(&self, name: &str) -> Option<String> {
        self.files.read().await.get(name).cloned()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.files.read().await.contains_key(name)
    }

    /// Stored names in sorted order.
    pub async fn names(&self) -> Vec<String> {
        self.files.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn write(&self, name: &str, content: &str) -> DomainResult<ArtifactId> {
        validate_name(name)?;
        self.files
            .write()
            .await
            .insert(name.to_string(), content.to_string());
        Ok(self.locate(name))
    }

    async fn read(&self, name: &str) -> DomainResult<Option<String>> {
        validate_name(name)?;
        Ok(self.get(name).await)
    }

    async fn delete(&self, name: &str) -> DomainResult<()> {
        validate_name(name)?;
        self.files.write().await.remove(name);
        Ok(())
    }

    fn locate(&self, name: &str) -> ArtifactId {
        ArtifactId::new(&self.package, name, self.dir.join(name))
    }
}

/// Hands out one shared [`InMemoryFileStore`] per package.
#[derive(Debug)]
pub struct InMemoryFileStoreProvider {
    root: PathBuf,
    stores: RwLock<HashMap<String, Arc<InMemoryFileStore>>>,
}

impl InMemoryFileStoreProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// The store opened for `package`, if any.
    pub async fn store(&self, package: &str) -> Option<Arc<InMemoryFileStore>> {
        self.stores.read().await.get(package).cloned()
    }
}

#[async_trait]
impl FileStoreProvider for InMemoryFileStoreProvider {
    async fn open_package(&self, package: &str) -> DomainResult<Arc<dyn FileStore>> {
        let dir = package_dir(&self.root, package)?;
        let mut stores = self.stores.write().await;
        let store = stores
            .entry(package.to_string())
            .or_insert_with(|| Arc::new(InMemoryFileStore::new(package, dir)))
            .clone();
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_package_shares_store() {
        let provider = InMemoryFileStoreProvider::new("/out");
        let a = provider.open_package("com.acme").await.unwrap();
        let b = provider.open_package("com.acme").await.unwrap();

        a.write("T.java", "x").await.unwrap();
        assert_eq!(b.read("T.java").await.unwrap().as_deref(), Some("x"));
        assert_eq!(
            a.locate("T.java").path,
            PathBuf::from("/out/com/acme/T.java")
        );
    }

    #[tokio::test]
    async fn test_names_are_sorted() {
        let store = InMemoryFileStore::new("p", "/mem");
        store.write("b.java", "").await.unwrap();
        store.write("a.java", "").await.unwrap();
        assert_eq!(store.names().await, vec!["a.java", "b.java"]);
    }
}
