//! Generated artifacts and the outcomes of validating them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identity of a persisted artifact, handed to the compiler and test runner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId {
    /// Dotted package the artifact belongs to
    pub package: String,

    /// File name inside the package directory, e.g. `InvoiceTest.java`
    pub name: String,

    /// Absolute or store-relative location
    pub path: PathBuf,
}

impl ArtifactId {
    pub fn new(package: impl Into<String>, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            path: path.into(),
        }
    }

    /// Name without extension; for Java this is the class name.
    pub fn stem(&self) -> &str {
        self.name.rsplit_once('.').map_or(self.name.as_str(), |(stem, _)| stem)
    }

    /// Fully qualified class name derived from package and stem.
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.stem().to_string()
        } else {
            format!("{}.{}", self.package, self.stem())
        }
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Result of compiling one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "messages", rename_all = "snake_case")]
pub enum CompileOutcome {
    Ok,
    Aborted,
    Timeout,
    Interrupted,
    Failed(Vec<String>),
}

impl CompileOutcome {
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Diagnostic text fed back to the oracle. Empty for a clean compile.
    pub fn diagnostics(&self) -> String {
        match self {
            Self::Ok => String::new(),
            Self::Aborted => "COMPILATION_ABORTED".to_string(),
            Self::Timeout => "COMPILATION_TIMEOUT".to_string(),
            Self::Interrupted => "COMPILATION_INTERRUPTED".to_string(),
            Self::Failed(messages) => {
                let mut text = String::from("COMPILATION_FAILED");
                for message in messages {
                    text.push('\n');
                    text.push_str(message);
                }
                text
            }
        }
    }
}

/// Result of executing a compiled test artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "console", rename_all = "snake_case")]
pub enum TestOutcome {
    Ok,
    Failed(String),
}

impl TestOutcome {
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn diagnostics(&self) -> String {
        match self {
            Self::Ok => String::new(),
            Self::Failed(console) => console.trim().to_string(),
        }
    }
}
