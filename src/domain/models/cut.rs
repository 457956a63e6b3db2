//! The class under test.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A source unit selected for test generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassUnderTest {
    /// Simple class name, e.g. `InvoiceService`
    pub name: String,

    /// Dotted package name; empty for the default package
    pub package: String,

    /// Full source text of the containing file
    #[serde(skip_serializing)]
    pub source: String,

    /// Where the source was read from, when it came from disk
    pub path: Option<PathBuf>,
}

impl ClassUnderTest {
    /// Build a CUT from source text, reading the package declaration.
    pub fn from_source(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            name: name.into(),
            package: parse_package(&source).unwrap_or_default(),
            source,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Fully qualified name, `package.Name` or `Name` in the default package.
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    /// Relative directory that mirrors the package, e.g. `com/acme/billing`.
    pub fn package_path(&self) -> PathBuf {
        self.package.split('.').filter(|p| !p.is_empty()).collect()
    }
}

/// Extract the `package a.b.c;` declaration from Java-like source.
///
/// Line and block comments preceding the declaration are skipped.
pub fn parse_package(source: &str) -> Option<String> {
    let mut in_block_comment = false;
    for raw in source.lines() {
        let mut line = raw.trim();
        if in_block_comment {
            match line.find("*/") {
                Some(end) => {
                    in_block_comment = false;
                    line = line[end + 2..].trim();
                }
                None => continue,
            }
        }
        if line.starts_with("/*") {
            match line.find("*/") {
                Some(end) => line = line[end + 2..].trim(),
                None => {
                    in_block_comment = true;
                    continue;
                }
            }
        }
        if line.is_empty() || line.starts_with("//") || line.starts_with('@') {
            continue;
        }
        return line
            .strip_prefix("package ")
            .and_then(|rest| rest.split(';').next())
            .map(|pkg| pkg.trim().to_string())
            .filter(|pkg| !pkg.is_empty());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_plain() {
        let src = "package com.acme.billing;\n\npublic class Invoice {}";
        assert_eq!(parse_package(src).as_deref(), Some("com.acme.billing"));
    }

    #[test]
    fn test_parse_package_after_license_comment() {
        let src = "/*\n * Copyright\n */\n// header\npackage com.acme;\nclass A {}";
        assert_eq!(parse_package(src).as_deref(), Some("com.acme"));
    }

    #[test]
    fn test_default_package() {
        let src = "import java.util.List;\nclass A {}";
        assert_eq!(parse_package(src), None);

        let cut = ClassUnderTest::from_source("A", src);
        assert_eq!(cut.package, "");
        assert_eq!(cut.qualified_name(), "A");
        assert_eq!(cut.package_path(), PathBuf::new());
    }

    #[test]
    fn test_package_path_mirrors_namespace() {
        let cut = ClassUnderTest::from_source("Invoice", "package com.acme.billing;");
        assert_eq!(cut.qualified_name(), "com.acme.billing.Invoice");
        assert_eq!(cut.package_path(), PathBuf::from("com/acme/billing"));
    }
}
