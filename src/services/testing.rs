//! Scripted collaborators shared by the service unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    placeholders, ArtifactId, CompileOutcome, OracleRequest, OracleResponse, PipelineConfig,
    ScenarioState, TestOutcome, TestScenario,
};
use crate::domain::ports::{
    CodeGenerationOracle, CompileService, FileStore, SourceIndex, TestExecutionService,
};
use crate::infrastructure::fs::InMemoryFileStore;

type Script = dyn Fn(&OracleRequest) -> DomainResult<OracleResponse> + Send + Sync;

pub struct ScriptedOracle {
    script: Box<Script>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
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

    pub fn calls_for(&self, test_class_name: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.context.get(placeholders::TEST_CLASS_NAME) == Some(test_class_name))
            .count()
    }
}

#[async_trait]
impl CodeGenerationOracle for ScriptedOracle {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, request: OracleRequest) -> DomainResult<OracleResponse> {
        let reply = (self.script)(&request);
        self.requests.lock().unwrap().push(request);
        reply
    }
}

/// Test source that compiles when `ok`, otherwise carries a marker the
/// [`SourceCheckingCompiler`] rejects.
pub fn broken_unless(class_name: &str, ok: bool) -> String {
    if ok {
        format!("class {class_name} {{}}")
    } else {
        format!("class {class_name} {{ BROKEN }}")
    }
}

/// Fails any artifact whose stored text contains `BROKEN`.
pub struct SourceCheckingCompiler {
    store: Arc<InMemoryFileStore>,
    compiles: AtomicUsize,
}

impl SourceCheckingCompiler {
    pub fn new(store: Arc<InMemoryFileStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            compiles: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompileService for SourceCheckingCompiler {
    async fn compile(&self, artifact: &ArtifactId) -> DomainResult<CompileOutcome> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        let source = self.store.get(&artifact.name).await.unwrap_or_default();
        if source.contains("BROKEN") {
            Ok(CompileOutcome::Failed(vec![format!(
                "{}:3: error: cannot find symbol Foo",
                artifact.name
            )]))
        } else {
            Ok(CompileOutcome::Ok)
        }
    }
}

/// Runner returning a fixed sequence of outcomes, then `Ok`.
pub struct QueuedRunner {
    outcomes: Mutex<Vec<TestOutcome>>,
    runs: AtomicUsize,
}

impl QueuedRunner {
    pub fn new(mut outcomes: Vec<TestOutcome>) -> Arc<Self> {
        outcomes.reverse();
        Arc::new(Self {
            outcomes: Mutex::new(outcomes),
            runs: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TestExecutionService for QueuedRunner {
    async fn run(&self, _artifact: &ArtifactId) -> DomainResult<TestOutcome> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(self.outcomes.lock().unwrap().pop().unwrap_or(TestOutcome::Ok))
    }
}

#[derive(Default)]
pub struct FixedIndex {
    sources: HashMap<String, String>,
}

impl FixedIndex {
    pub fn with(identifier: &str, source: &str) -> Self {
        let mut sources = HashMap::new();
        sources.insert(identifier.to_string(), source.to_string());
        Self { sources }
    }
}

#[async_trait]
impl SourceIndex for FixedIndex {
    async fn resolve(&self, identifier: &str) -> DomainResult<Option<String>> {
        Ok(self.sources.get(identifier).cloned())
    }
}

pub fn memory_store(package: &str) -> (Arc<InMemoryFileStore>, Arc<dyn FileStore>) {
    let store = Arc::new(InMemoryFileStore::new(package, PathBuf::from("/mem")));
    let dyn_store: Arc<dyn FileStore> = store.clone();
    (store, dyn_store)
}

pub fn scenario_states(cut_name: &str, n: usize) -> Vec<ScenarioState> {
    let pipeline = PipelineConfig::default();
    (0..n)
        .map(|i| {
            ScenarioState::new(
                i,
                TestScenario::new(format!("method{i}"), "void", format!("scenario {i}")),
                pipeline.temp_artifact_name(cut_name, i),
            )
        })
        .collect()
}
