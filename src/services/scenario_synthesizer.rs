//! Round-based generate/compile/retry loop over a CUT's scenarios.
//!
//! Each round first compiles every candidate written in the previous round
//! (one compile at a time), abandons scenarios whose budget is spent, then
//! fans out one oracle call per remaining scenario and joins them all before
//! anything is persisted.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    placeholders, render_list, strip_code_fences, ClassUnderTest, OracleRequest, OracleResponse,
    PromptContext, PromptKind, ScenarioState, SynthesisReport,
};
use crate::domain::ports::{
    CodeGenerationOracle, CompileService, FileStore, ProgressReporter, SourceIndex,
};

/// Budget for one synthesizer run.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisLimits {
    /// Oracle generations per scenario.
    pub max_attempts: u32,
    /// Oracle calls in flight within a round.
    pub max_concurrency: usize,
}

impl Default for SynthesisLimits {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            max_concurrency: 8,
        }
    }
}

pub struct ScenarioSynthesizer {
    oracle: Arc<dyn CodeGenerationOracle>,
    compiler: Arc<dyn CompileService>,
    source_index: Arc<dyn SourceIndex>,
    limits: SynthesisLimits,
}

type GenerationHandle = JoinHandle<DomainResult<OracleResponse>>;

impl ScenarioSynthesizer {
    pub fn new(
        oracle: Arc<dyn CodeGenerationOracle>,
        compiler: Arc<dyn CompileService>,
        source_index: Arc<dyn SourceIndex>,
        limits: SynthesisLimits,
    ) -> Self {
        Self {
            oracle,
            compiler,
            source_index,
            limits,
        }
    }

    pub const fn limits(&self) -> SynthesisLimits {
        self.limits
    }

    /// Drive `states` until every scenario is Completed or Abandoned, or the
    /// job is canceled.
    ///
    /// States that are already terminal are left alone, so running this over
    /// a fully completed set costs nothing. Compiler and storage errors
    /// propagate and fail the CUT; oracle errors only cost the scenario an
    /// attempt.
    #[instrument(skip_all, fields(cut = %cut.qualified_name(), scenarios = states.len()))]
    pub async fn synthesize(
        &self,
        cut: &ClassUnderTest,
        states: &mut [ScenarioState],
        store: &Arc<dyn FileStore>,
        progress: &dyn ProgressReporter,
    ) -> DomainResult<SynthesisReport> {
        let mut report = SynthesisReport::default();

        while states.iter().any(ScenarioState::is_pending) {
            if progress.is_canceled() {
                info!(round = report.rounds, "Synthesis canceled");
                report.canceled = true;
                break;
            }
            report.rounds += 1;
            let round = report.rounds;

            report.compiles += self.compile_pass(states, store.as_ref(), progress, round).await?;
            self.abandon_exhausted(states, store.as_ref()).await?;

            let pending: Vec<usize> = states
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_pending())
                .map(|(slot, _)| slot)
                .collect();
            if pending.is_empty() {
                break;
            }

            progress.set_detail(&format!(
                "Round {round}: generating {} of {} scenarios",
                pending.len(),
                states.len()
            ));
            let results = self.generate_pass(cut, states, &pending).await?;
            report.oracle_calls += u32::try_from(pending.len()).unwrap_or(u32::MAX);
            self.persist_round(states, results, store.as_ref()).await?;
        }

        report.collect_statuses(states);
        info!(
            rounds = report.rounds,
            completed = report.completed.len(),
            abandoned = report.abandoned.len(),
            canceled = report.canceled,
            "Scenario synthesis finished"
        );
        Ok(report)
    }

    /// Compile every candidate written last round, in scenario order.
    async fn compile_pass(
        &self,
        states: &mut [ScenarioState],
        store: &dyn FileStore,
        progress: &dyn ProgressReporter,
        round: u32,
    ) -> DomainResult<u32> {
        let mut compiles = 0;
        for state in states.iter_mut().filter(|s| s.is_pending() && s.awaiting_compile) {
            progress.set_detail(&format!(
                "Round {round}: compiling {}",
                state.artifact_name
            ));

            // The persisted text may have been reformatted on write.
            let Some(source) = store.read(&state.artifact_name).await? else {
                warn!(artifact = %state.artifact_name, "Candidate vanished before compile");
                state.reject(format!("{} was not found on disk", state.artifact_name));
                continue;
            };

            let artifact = store.locate(&state.artifact_name);
            let outcome = self.compiler.compile(&artifact).await?;
            compiles += 1;

            if outcome.is_ok() {
                debug!(scenario = state.index, attempt = state.attempt_count, "Candidate compiled");
                state.complete(source);
            } else {
                debug!(scenario = state.index, attempt = state.attempt_count, "Candidate rejected");
                state.current_source = Some(source);
                state.reject(outcome.diagnostics());
            }
        }
        Ok(compiles)
    }

    async fn abandon_exhausted(
        &self,
        states: &mut [ScenarioState],
        store: &dyn FileStore,
    ) -> DomainResult<()> {
        let max_attempts = self.limits.max_attempts;
        for state in states
            .iter_mut()
            .filter(|s| s.is_pending() && !s.has_budget(max_attempts))
        {
            warn!(
                scenario = state.index,
                attempts = state.attempt_count,
                method = %state.scenario.method_name,
                "Abandoning scenario after exhausting its attempts"
            );
            state.abandon();
            store.delete(&state.artifact_name).await?;
        }
        Ok(())
    }

    /// One oracle call per pending slot, bounded by the semaphore, joined
    /// into a result vector indexed by slot.
    async fn generate_pass(
        &self,
        cut: &ClassUnderTest,
        states: &[ScenarioState],
        pending: &[usize],
    ) -> DomainResult<Vec<Option<DomainResult<OracleResponse>>>> {
        let semaphore = Arc::new(Semaphore::new(self.limits.max_concurrency.max(1)));
        let mut handles: Vec<(usize, GenerationHandle)> = Vec::with_capacity(pending.len());

        for &slot in pending {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| DomainError::ExecutionFailed("Semaphore closed".to_string()))?;
            let oracle = Arc::clone(&self.oracle);
            let request = single_test_request(cut, &states[slot]);

            let handle = tokio::spawn(async move {
                let _permit = permit;
                oracle.generate(request).await
            });
            handles.push((slot, handle));
        }

        let mut results: Vec<Option<DomainResult<OracleResponse>>> =
            (0..states.len()).map(|_| None).collect();
        for (slot, handle) in handles {
            results[slot] = Some(handle.await.map_err(DomainError::from).and_then(|r| r));
        }
        Ok(results)
    }

    /// Write this round's candidates and resolve the context they asked for.
    async fn persist_round(
        &self,
        states: &mut [ScenarioState],
        results: Vec<Option<DomainResult<OracleResponse>>>,
        store: &dyn FileStore,
    ) -> DomainResult<()> {
        for (state, result) in states.iter_mut().zip(results) {
            match result {
                None => {}
                Some(Ok(response)) => {
                    let source = strip_code_fences(&response.text);
                    store.write(&state.artifact_name, &source).await?;
                    state.accept_candidate(source, response.context_paths);
                    state.context_sources = self.resolve_context(&state.context_paths).await;
                }
                Some(Err(e)) => {
                    warn!(
                        scenario = state.index,
                        attempt = state.attempt_count + 1,
                        error = %e,
                        "Oracle call failed; attempt consumed"
                    );
                    state.record_failed_generation();
                }
            }
        }
        Ok(())
    }

    async fn resolve_context(&self, paths: &[String]) -> Vec<String> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            match self.source_index.resolve(path).await {
                Ok(Some(source)) => sources.push(source),
                Ok(None) => debug!(identifier = %path, "Context class not found"),
                Err(e) => warn!(identifier = %path, error = %e, "Context lookup failed"),
            }
        }
        sources
    }
}

fn single_test_request(cut: &ClassUnderTest, state: &ScenarioState) -> OracleRequest {
    let test_class_name = state
        .artifact_name
        .rsplit_once('.')
        .map_or(state.artifact_name.as_str(), |(stem, _)| stem);

    let context = PromptContext::new()
        .with(placeholders::INPUT_CLASS, cut.source.clone())
        .with(placeholders::TEST_SCENARIO, state.scenario.to_string())
        .with(placeholders::TEST_CLASS_NAME, test_class_name)
        .with(
            placeholders::TEST_CLASS,
            state.current_source.clone().unwrap_or_default(),
        )
        .with(placeholders::ERROR_OUTPUT, state.last_compile_error.clone())
        .with(
            placeholders::CONTEXT_CLASSES,
            render_list(&state.context_sources),
        );
    OracleRequest::new(PromptKind::SingleTest, context)
}
