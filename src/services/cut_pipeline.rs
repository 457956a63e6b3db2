//! Per-CUT sequence: extract, synthesize, clean up, aggregate.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AggregationOutcome, ClassUnderTest, CutOutcome, CutReport, PipelineConfig, ScenarioState,
};
use crate::domain::ports::{FileStore, ProgressReporter};
use crate::services::aggregation_synthesizer::AggregationSynthesizer;
use crate::services::scenario_extractor::ScenarioExtractor;
use crate::services::scenario_synthesizer::ScenarioSynthesizer;

pub struct CutPipeline {
    extractor: ScenarioExtractor,
    synthesizer: ScenarioSynthesizer,
    aggregator: AggregationSynthesizer,
    naming: PipelineConfig,
}

impl CutPipeline {
    pub fn new(
        extractor: ScenarioExtractor,
        synthesizer: ScenarioSynthesizer,
        aggregator: AggregationSynthesizer,
        naming: PipelineConfig,
    ) -> Self {
        Self {
            extractor,
            synthesizer,
            aggregator,
            naming,
        }
    }

    /// Generate the final test class for one CUT inside `store`.
    ///
    /// Temp scenario artifacts are removed before synthesis and again
    /// afterwards, whether synthesis succeeded or not.
    #[instrument(skip_all, fields(cut = %cut.qualified_name()))]
    pub async fn process(
        &self,
        cut: &ClassUnderTest,
        store: &Arc<dyn FileStore>,
        progress: &dyn ProgressReporter,
    ) -> DomainResult<CutReport> {
        progress.set_detail(&format!("Extracting test scenarios for {}", cut.name));
        let scenarios = self.extractor.extract(cut).await?;
        info!(count = scenarios.len(), "Scenarios extracted");

        let mut states: Vec<ScenarioState> = scenarios
            .into_iter()
            .enumerate()
            .map(|(i, scenario)| {
                ScenarioState::new(i, scenario, self.naming.temp_artifact_name(&cut.name, i))
            })
            .collect();
        let temp_names: Vec<String> = states.iter().map(|s| s.artifact_name.clone()).collect();

        store.delete_all(&temp_names).await?;
        let synthesis = self
            .synthesizer
            .synthesize(cut, &mut states, store, progress)
            .await;
        store.delete_all(&temp_names).await?;
        let synthesis = synthesis?;

        let final_name = self.naming.final_artifact_name(&cut.name);
        let mut report = CutReport {
            cut: cut.qualified_name(),
            outcome: CutOutcome::Canceled,
            scenarios: states.len(),
            completed: synthesis.completed.len(),
            abandoned: synthesis.abandoned.len(),
            final_artifact: None,
            aggregation: None,
        };

        if !synthesis.abandoned.is_empty() {
            warn!(
                abandoned = synthesis.abandoned.len(),
                total = states.len(),
                "Some scenarios were abandoned and are left out of the final class"
            );
        }
        if synthesis.canceled {
            return Ok(report);
        }

        let inputs: Vec<String> = states
            .iter()
            .filter(|s| synthesis.completed.contains(&s.index))
            .filter_map(|s| s.current_source.clone())
            .collect();

        progress.set_detail(&format!("Aggregating tests into {final_name}"));
        let aggregation = self
            .aggregator
            .aggregate(cut, &inputs, &final_name, store, progress)
            .await?;

        report.outcome = match aggregation.outcome {
            AggregationOutcome::Succeeded => CutOutcome::Generated,
            AggregationOutcome::Exhausted => CutOutcome::BestEffort,
            AggregationOutcome::Canceled => CutOutcome::Canceled,
        };
        if aggregation.attempts > 0 && store.read(&final_name).await?.is_some() {
            report.final_artifact = Some(store.locate(&final_name).to_string());
        }
        report.aggregation = Some(aggregation);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::models::{placeholders, OracleResponse, PromptKind};
    use crate::domain::ports::SilentProgress;
    use crate::services::scenario_synthesizer::SynthesisLimits;
    use crate::services::testing::{
        broken_unless, memory_store, FixedIndex, ScriptedOracle, SourceCheckingCompiler,
    };

    const THREE_SCENARIOS: &str = r#"{"testScenarios":[
        {"methodname":"total","returntype":"int","scenario":"a"},
        {"methodname":"total","returntype":"int","scenario":"b"},
        {"methodname":"total","returntype":"int","scenario":"c"}]}"#;

    fn pipeline(
        oracle: Arc<ScriptedOracle>,
        compiler: Arc<SourceCheckingCompiler>,
        max_attempts: u32,
    ) -> CutPipeline {
        CutPipeline::new(
            ScenarioExtractor::new(oracle.clone()),
            ScenarioSynthesizer::new(
                oracle.clone(),
                compiler.clone(),
                Arc::new(FixedIndex::default()),
                SynthesisLimits {
                    max_attempts,
                    max_concurrency: 2,
                },
            ),
            AggregationSynthesizer::new(oracle, compiler, max_attempts),
            PipelineConfig::default(),
        )
    }

    fn cut() -> ClassUnderTest {
        ClassUnderTest::from_source("Invoice", "package com.acme;\nclass Invoice {}")
    }

    #[tokio::test]
    async fn test_abandoned_scenario_is_left_out_of_aggregation() {
        let (store, dyn_store) = memory_store("com.acme");
        let oracle = ScriptedOracle::new(|req| match req.kind {
            PromptKind::Scenarios => Ok(OracleResponse::text(THREE_SCENARIOS)),
            PromptKind::SingleTest => {
                let name = req.context.get(placeholders::TEST_CLASS_NAME).unwrap_or_default();
                let first = req.context.get(placeholders::TEST_CLASS).unwrap_or_default().is_empty();
                Ok(OracleResponse::text(broken_unless(name, !first && !name.ends_with('1'))))
            }
            PromptKind::AggregateTestClass => Ok(OracleResponse::text("class InvoiceTest {}")),
        });
        let compiler = SourceCheckingCompiler::new(store.clone());

        let report = pipeline(oracle.clone(), compiler, 4)
            .process(&cut(), &dyn_store, &SilentProgress::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, CutOutcome::Generated);
        assert_eq!((report.scenarios, report.completed, report.abandoned), (3, 2, 1));
        let aggregate = oracle
            .requests()
            .into_iter()
            .find(|r| r.kind == PromptKind::AggregateTestClass)
            .unwrap();
        assert_eq!(
            aggregate.context.get(placeholders::ADDITIONAL_TEST_CLASSES),
            Some("[class InvoiceTmpTest0 {}, class InvoiceTmpTest2 {}]")
        );
        assert_eq!(store.names().await, vec!["InvoiceTest.java".to_string()]);
        assert_eq!(report.final_artifact.as_deref(), Some("/mem/InvoiceTest.java"));
    }

    #[tokio::test]
    async fn test_stale_temp_artifacts_are_removed_first() {
        let (store, dyn_store) = memory_store("com.acme");
        dyn_store.write("InvoiceTmpTest0.java", "class InvoiceTmpTest0 {}").await.unwrap();
        let oracle = ScriptedOracle::new(|req| match req.kind {
            PromptKind::Scenarios => Ok(OracleResponse::text(
                r#"{"testScenarios":[{"methodname":"total"}]}"#,
            )),
            _ => Ok(OracleResponse::text("class X {}")),
        });
        let compiler = SourceCheckingCompiler::new(store.clone());

        pipeline(oracle.clone(), compiler.clone(), 3)
            .process(&cut(), &dyn_store, &SilentProgress::new())
            .await
            .unwrap();

        // One compile for the fresh candidate, one for the final class.
        assert_eq!(compiler.count(), 2);
        assert!(!store.contains("InvoiceTmpTest0.java").await);
    }

    #[tokio::test]
    async fn test_extraction_failure_fails_the_cut() {
        let (store, dyn_store) = memory_store("com.acme");
        let oracle = ScriptedOracle::new(|_| Ok(OracleResponse::text("not json")));
        let compiler = SourceCheckingCompiler::new(store);

        let err = pipeline(oracle, compiler, 3)
            .process(&cut(), &dyn_store, &SilentProgress::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_best_effort_when_aggregation_exhausted() {
        let (store, dyn_store) = memory_store("com.acme");
        let oracle = ScriptedOracle::new(|req| match req.kind {
            PromptKind::Scenarios => Ok(OracleResponse::text(r#"{"testScenarios":[]}"#)),
            _ => Ok(OracleResponse::text(broken_unless("InvoiceTest", false))),
        });
        let compiler = SourceCheckingCompiler::new(store.clone());

        let report = pipeline(oracle, compiler, 2)
            .process(&cut(), &dyn_store, &SilentProgress::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, CutOutcome::BestEffort);
        assert_eq!(report.scenarios, 0);
        assert!(store.contains("InvoiceTest.java").await);
    }
}
