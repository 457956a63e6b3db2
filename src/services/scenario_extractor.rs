//! Scenario extraction: one oracle call turning a CUT into a scenario list.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    placeholders, strip_code_fences, ClassUnderTest, OracleRequest, PromptContext, PromptKind,
    ScenarioList, TestScenario,
};
use crate::domain::ports::CodeGenerationOracle;

/// Asks the oracle which test scenarios a class needs.
pub struct ScenarioExtractor {
    oracle: Arc<dyn CodeGenerationOracle>,
}

impl ScenarioExtractor {
    pub fn new(oracle: Arc<dyn CodeGenerationOracle>) -> Self {
        Self { oracle }
    }

    /// Extract the ordered scenario list for `cut`.
    ///
    /// Oracle failures and unparsable responses both surface as
    /// [`DomainError::ExtractionFailed`]. An empty list is a valid result.
    #[instrument(skip(self, cut), fields(cut = %cut.qualified_name()))]
    pub async fn extract(&self, cut: &ClassUnderTest) -> DomainResult<Vec<TestScenario>> {
        let context = PromptContext::new().with(placeholders::INPUT_CLASS, cut.source.clone());
        let response = self
            .oracle
            .generate(OracleRequest::new(PromptKind::Scenarios, context))
            .await
            .map_err(|e| DomainError::ExtractionFailed(e.to_string()))?;

        let scenarios = parse_scenarios(&response.text)?;
        debug!(count = scenarios.len(), "Extracted test scenarios");
        Ok(scenarios)
    }
}

/// Parse `{"testScenarios": [...]}`, tolerating code fences and a bare array.
pub fn parse_scenarios(text: &str) -> DomainResult<Vec<TestScenario>> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(DomainError::ExtractionFailed(
            "oracle returned an empty scenario response".to_string(),
        ));
    }

    match serde_json::from_str::<ScenarioList>(&body) {
        Ok(list) => Ok(list.test_scenarios),
        Err(object_err) => serde_json::from_str::<Vec<TestScenario>>(&body).map_err(|_| {
            DomainError::ExtractionFailed(format!("unparsable scenario list: {object_err}"))
        }),
    }
}
