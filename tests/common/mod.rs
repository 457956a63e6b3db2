//! Common test utilities for integration tests
//!
//! Provides fake collaborators and project fixtures shared across the
//! integration test files.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use testforge::domain::models::{
    placeholders, ArtifactId, CompileOutcome, OracleRequest, OracleResponse, PromptKind,
};
use testforge::{CodeGenerationOracle, CompileService, DomainResult};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

type Script = dyn Fn(&OracleRequest) -> DomainResult<OracleResponse> + Send + Sync;

/// Oracle whose replies are computed by a closure; records every request.
pub struct FakeOracle {
    script: Box<Script>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl FakeOracle {
    pub fn new(
        script: impl Fn(&OracleRequest) -> DomainResult<OracleResponse> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, kind: PromptKind) -> usize {
        self.requests().iter().filter(|r| r.kind == kind).count()
    }
}

#[async_trait]
impl CodeGenerationOracle for FakeOracle {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn generate(&self, request: OracleRequest) -> DomainResult<OracleResponse> {
        let reply = (self.script)(&request);
        self.requests.lock().unwrap().push(request);
        reply
    }
}

/// Compiler that reads the artifact from disk and rejects `BROKEN` sources.
#[derive(Default)]
pub struct DiskCompiler {
    compiles: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl DiskCompiler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompileService for DiskCompiler {
    async fn compile(&self, artifact: &ArtifactId) -> DomainResult<CompileOutcome> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.compiles.fetch_add(1, Ordering::SeqCst);

        let source = tokio::fs::read_to_string(&artifact.path).await;
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match source {
            Ok(text) if text.contains("BROKEN") => Ok(CompileOutcome::Failed(vec![format!(
                "{}:3: error: cannot find symbol Foo",
                artifact.name
            )])),
            Ok(_) => Ok(CompileOutcome::Ok),
            Err(e) => Ok(CompileOutcome::Failed(vec![e.to_string()])),
        }
    }
}

/// Scenario list JSON with `n` scenarios for method `m`.
pub fn scenarios_json(n: usize) -> String {
    let items: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            serde_json::json!({
                "methodname": "total",
                "returntype": "int",
                "scenario": format!("case {i}")
            })
        })
        .collect();
    serde_json::json!({ "testScenarios": items }).to_string()
}

/// Test class name the request is about.
pub fn requested_class(request: &OracleRequest) -> String {
    request
        .context
        .get(placeholders::TEST_CLASS_NAME)
        .unwrap_or_default()
        .to_string()
}

/// A small project with two packages under `src/main/java`.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let project = Self { dir };
        project.write(
            "src/main/java/com/acme/billing/Invoice.java",
            "package com.acme.billing;\n\npublic class Invoice {\n    public int total() { return 0; }\n}\n",
        );
        project.write(
            "src/main/java/com/acme/billing/Payment.java",
            "package com.acme.billing;\n\npublic class Payment {}\n",
        );
        project.write(
            "src/main/java/com/acme/util/Money.java",
            "package com.acme.util;\n\npublic class Money {}\n",
        );
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn source_root(&self) -> PathBuf {
        self.root().join("src/main/java")
    }

    pub fn test_root(&self) -> PathBuf {
        self.root().join("src/test/java")
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }
}
