//! Merges the accepted scenario classes into the final test artifact.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    placeholders, render_list, strip_code_fences, AggregationOutcome, AggregationReport,
    AggregationState, ClassUnderTest, OracleRequest, PromptContext, PromptKind,
};
use crate::domain::ports::{
    CodeGenerationOracle, CompileService, FileStore, ProgressReporter, TestExecutionService,
};

pub struct AggregationSynthesizer {
    oracle: Arc<dyn CodeGenerationOracle>,
    compiler: Arc<dyn CompileService>,
    test_runner: Option<Arc<dyn TestExecutionService>>,
    max_attempts: u32,
}

impl AggregationSynthesizer {
    pub fn new(
        oracle: Arc<dyn CodeGenerationOracle>,
        compiler: Arc<dyn CompileService>,
        max_attempts: u32,
    ) -> Self {
        Self {
            oracle,
            compiler,
            test_runner: None,
            max_attempts,
        }
    }

    /// Also run the merged class once it compiles; failures feed the retry.
    #[must_use]
    pub fn with_test_runner(mut self, runner: Arc<dyn TestExecutionService>) -> Self {
        self.test_runner = Some(runner);
        self
    }

    /// Produce `final_artifact_name` from `inputs`.
    ///
    /// An existing final artifact is handed to the oracle so its tests are
    /// kept. When the budget runs out the last candidate stays on disk and
    /// the report carries the outcome `Exhausted`.
    #[instrument(skip_all, fields(cut = %cut.qualified_name(), inputs = inputs.len()))]
    pub async fn aggregate(
        &self,
        cut: &ClassUnderTest,
        inputs: &[String],
        final_artifact_name: &str,
        store: &Arc<dyn FileStore>,
        progress: &dyn ProgressReporter,
    ) -> DomainResult<AggregationReport> {
        let mut state = AggregationState::new(final_artifact_name);
        state.current_source = store.read(final_artifact_name).await?;
        let test_class_name = final_artifact_name
            .rsplit_once('.')
            .map_or(final_artifact_name, |(stem, _)| stem);
        let merged_inputs = render_list(inputs);

        while state.attempt_count < self.max_attempts {
            if state.attempt_count > 0 && progress.is_canceled() {
                info!(attempts = state.attempt_count, "Aggregation canceled");
                return Ok(AggregationReport::from_state(
                    &state,
                    AggregationOutcome::Canceled,
                    inputs.len(),
                ));
            }
            state.attempt_count += 1;
            progress.set_detail(&format!(
                "Merging {} test classes into {final_artifact_name} (attempt {})",
                inputs.len(),
                state.attempt_count
            ));

            let context = PromptContext::new()
                .with(placeholders::INPUT_CLASS, cut.source.clone())
                .with(placeholders::TEST_CLASS_NAME, test_class_name)
                .with(
                    placeholders::TEST_CLASS,
                    state.current_source.clone().unwrap_or_default(),
                )
                .with(placeholders::ADDITIONAL_TEST_CLASSES, merged_inputs.clone())
                .with(placeholders::ERROR_OUTPUT, state.last_error.clone());

            let response = match self
                .oracle
                .generate(OracleRequest::new(PromptKind::AggregateTestClass, context))
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(attempt = state.attempt_count, error = %e, "Aggregation oracle call failed");
                    continue;
                }
            };

            let source = strip_code_fences(&response.text);
            let artifact = store.write(final_artifact_name, &source).await?;
            state.current_source = Some(source);

            let compiled = self.compiler.compile(&artifact).await?;
            state.last_error = compiled.diagnostics();
            if compiled.is_ok() {
                if let Some(runner) = &self.test_runner {
                    state.last_error = runner.run(&artifact).await?.diagnostics();
                }
            }

            if state.last_error.is_empty() {
                info!(attempts = state.attempt_count, artifact = %artifact, "Final test class ready");
                return Ok(AggregationReport::from_state(
                    &state,
                    AggregationOutcome::Succeeded,
                    inputs.len(),
                ));
            }
            debug!(attempt = state.attempt_count, "Final test class rejected");
        }

        warn!(
            attempts = state.attempt_count,
            "Aggregation budget exhausted; keeping last candidate"
        );
        Ok(AggregationReport::from_state(
            &state,
            AggregationOutcome::Exhausted,
            inputs.len(),
        ))
    }
}
