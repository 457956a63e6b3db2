//! Filesystem lookup of source units and CUT discovery

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ClassUnderTest;
use crate::domain::ports::SourceIndex;

const SOURCE_EXTENSION: &str = "java";
const SKIPPED_UNITS: [&str; 2] = ["package-info.java", "module-info.java"];

/// Resolves class names and relative paths against a list of source roots.
#[derive(Debug, Clone)]
pub struct FsSourceIndex {
    roots: Vec<PathBuf>,
}

impl FsSourceIndex {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Candidate paths for an identifier, most specific first.
    ///
    /// `com.acme.Outer.Inner` also tries `com/acme/Outer.java`, since
    /// nested classes live in their enclosing class's file. Absolute paths
    /// and `..` segments yield no candidates.
    fn candidates(&self, identifier: &str) -> Vec<PathBuf> {
        let identifier = identifier.trim();
        let mut relative: Vec<PathBuf> = Vec::new();

        if identifier.ends_with(&format!(".{SOURCE_EXTENSION}")) || identifier.contains('/') {
            relative.push(PathBuf::from(identifier));
        } else {
            let segments: Vec<&str> = identifier.split('.').filter(|s| !s.is_empty()).collect();
            for end in (1..=segments.len()).rev() {
                let mut path: PathBuf = segments[..end].iter().collect();
                path.set_extension(SOURCE_EXTENSION);
                relative.push(path);
                let starts_upper = segments[end - 1]
                    .chars()
                    .next()
                    .is_some_and(char::is_uppercase);
                let parent_upper = end >= 2
                    && segments[end - 2]
                        .chars()
                        .next()
                        .is_some_and(char::is_uppercase);
                if !(starts_upper && parent_upper) {
                    break;
                }
            }
        }

        let mut paths = Vec::new();
        for rel in relative.iter().filter(|rel| is_confined(rel)) {
            for root in &self.roots {
                paths.push(root.join(rel));
            }
        }
        paths
    }

    /// Whether `path` exists and, after resolving symlinks, sits under a root.
    async fn within_roots(&self, path: &Path) -> bool {
        let Ok(real) = tokio::fs::canonicalize(path).await else {
            return false;
        };
        for root in &self.roots {
            if let Ok(root) = tokio::fs::canonicalize(root).await {
                if real.starts_with(&root) {
                    return true;
                }
            }
        }
        false
    }
}

fn is_confined(relative: &Path) -> bool {
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

#[async_trait]
impl SourceIndex for FsSourceIndex {
    async fn resolve(&self, identifier: &str) -> DomainResult<Option<String>> {
        for path in self.candidates(identifier) {
            if !self.within_roots(&path).await {
                continue;
            }
            match tokio::fs::read_to_string(&path).await {
                Ok(source) => {
                    debug!(identifier, path = %path.display(), "Context source resolved");
                    return Ok(Some(source));
                }
                Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!(identifier, "Context source not found");
        Ok(None)
    }
}

/// Expand command-line targets into classes under test.
///
/// A target is a source file, a directory (searched recursively), or a
/// dotted package name looked up in each source root (classes directly in
/// that package only). Results keep target order and are deduplicated.
pub async fn discover_cuts(
    targets: &[String],
    source_roots: &[PathBuf],
) -> DomainResult<Vec<ClassUnderTest>> {
    let mut seen = BTreeSet::new();
    let mut cuts = Vec::new();

    for target in targets {
        let files = target_files(target, source_roots).await?;
        if files.is_empty() {
            warn!(target, "Target contains no source files");
        }
        for file in files {
            if !seen.insert(file.clone()) {
                continue;
            }
            cuts.push(load_cut(&file).await?);
        }
    }
    Ok(cuts)
}

async fn target_files(target: &str, source_roots: &[PathBuf]) -> DomainResult<Vec<PathBuf>> {
    let path = Path::new(target);
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {
            if is_source_file(path) {
                return Ok(vec![path.to_path_buf()]);
            }
            return Err(DomainError::ValidationFailed(format!(
                "{target} is not a .{SOURCE_EXTENSION} file"
            )));
        }
        Ok(meta) if meta.is_dir() => return list_sources(path, true).await,
        _ => {}
    }

    if !is_package_name(target) {
        return Err(DomainError::ValidationFailed(format!(
            "{target} is neither a file, a directory nor a package name"
        )));
    }

    let package_path: PathBuf = target.split('.').collect();
    let mut files = Vec::new();
    for root in source_roots {
        let dir = root.join(&package_path);
        if tokio::fs::metadata(&dir).await.is_ok_and(|m| m.is_dir()) {
            files.extend(list_sources(&dir, false).await?);
        }
    }
    if files.is_empty() {
        return Err(DomainError::ValidationFailed(format!(
            "package {target} not found under the configured source roots"
        )));
    }
    Ok(files)
}

async fn list_sources(dir: &Path, recursive: bool) -> DomainResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        let mut here = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                if recursive {
                    pending.push(path);
                }
            } else if is_source_file(&path) {
                here.push(path);
            }
        }
        here.sort();
        files.extend(here);
    }
    files.sort();
    Ok(files)
}

async fn load_cut(path: &Path) -> DomainResult<ClassUnderTest> {
    let source = tokio::fs::read_to_string(path).await?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| DomainError::ValidationFailed(format!("bad file name {}", path.display())))?;
    Ok(ClassUnderTest::from_source(name, source).with_path(path))
}

fn is_source_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) && !SKIPPED_UNITS.contains(&name)
}

fn is_package_name(target: &str) -> bool {
    !target.is_empty()
        && target.split('.').all(|segment| {
            segment
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_')
                && segment.chars().all(|c| c.is_alphanumeric() || c == '_')
        })
}
