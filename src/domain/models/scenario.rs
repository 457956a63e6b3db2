//! Test scenarios and the per-scenario synthesis state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One behavioral case proposed by the oracle for a method of the CUT.
///
/// Scenarios are produced once per CUT and never mutated; their position in
/// the extracted list is the stable index used everywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestScenario {
    /// Name of the method under test
    #[serde(rename = "methodname")]
    pub method_name: String,

    /// Return type of the method under test
    #[serde(rename = "returntype", default)]
    pub return_type: String,

    /// Short description of the behavior to cover
    #[serde(rename = "scenario", default)]
    pub description: String,
}

impl TestScenario {
    pub fn new(
        method_name: impl Into<String>,
        return_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            method_name: method_name.into(),
            return_type: return_type.into(),
            description: description.into(),
        }
    }

    /// Compact form without the description, for progress lines.
    pub fn one_liner(&self) -> String {
        format!("{}(): {}", self.method_name, self.return_type)
    }
}

impl fmt::Display for TestScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TestScenario{{methodname='{}', returntype='{}', scenario='{}'}}",
            self.method_name, self.return_type, self.description
        )
    }
}

/// Envelope returned by the oracle for a scenario extraction prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioList {
    #[serde(rename = "testScenarios")]
    pub test_scenarios: Vec<TestScenario>,
}

/// Lifecycle of a scenario candidate.
///
/// `Completed` and `Abandoned` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Pending,
    Completed,
    Abandoned,
}

impl ScenarioStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        };
        f.write_str(s)
    }
}

/// Mutable synthesis state for one scenario.
///
/// Owned exclusively by the round loop of the synthesizer processing the CUT.
#[derive(Debug, Clone)]
pub struct ScenarioState {
    /// Position in the extracted scenario list
    pub index: usize,

    /// The scenario this state drives
    pub scenario: TestScenario,

    /// Temp artifact slot, unique per scenario within the CUT
    pub artifact_name: String,

    /// Most recent candidate source, if any was generated
    pub current_source: Option<String>,

    /// Diagnostic text from the last compile, empty when none
    pub last_compile_error: String,

    /// Oracle generations consumed so far
    pub attempt_count: u32,

    pub status: ScenarioStatus,

    /// Context identifiers requested by the oracle in its last response
    pub context_paths: Vec<String>,

    /// Resolved source of `context_paths`, fed into the next prompt
    pub context_sources: Vec<String>,

    /// A freshly written candidate has not been compiled yet
    pub awaiting_compile: bool,
}

impl ScenarioState {
    pub fn new(index: usize, scenario: TestScenario, artifact_name: impl Into<String>) -> Self {
        Self {
            index,
            scenario,
            artifact_name: artifact_name.into(),
            current_source: None,
            last_compile_error: String::new(),
            attempt_count: 0,
            status: ScenarioStatus::Pending,
            context_paths: Vec::new(),
            context_sources: Vec::new(),
            awaiting_compile: false,
        }
    }

    pub const fn is_pending(&self) -> bool {
        matches!(self.status, ScenarioStatus::Pending)
    }

    /// Whether another oracle generation may be spent on this scenario.
    pub const fn has_budget(&self, max_attempts: u32) -> bool {
        self.attempt_count < max_attempts
    }

    /// Record a clean compile of `source`.
    pub fn complete(&mut self, source: String) {
        self.current_source = Some(source);
        self.last_compile_error.clear();
        self.awaiting_compile = false;
        self.status = ScenarioStatus::Completed;
    }

    /// Record a failed compile with its diagnostic text.
    pub fn reject(&mut self, diagnostics: String) {
        self.last_compile_error = diagnostics;
        self.awaiting_compile = false;
    }

    /// Store a new candidate produced by the oracle.
    pub fn accept_candidate(&mut self, source: String, context_paths: Vec<String>) {
        self.current_source = Some(source);
        self.context_paths = context_paths;
        self.awaiting_compile = true;
        self.attempt_count += 1;
    }

    /// Count an attempt whose oracle call produced nothing.
    pub fn record_failed_generation(&mut self) {
        self.attempt_count += 1;
    }

    pub fn abandon(&mut self) {
        self.awaiting_compile = false;
        self.status = ScenarioStatus::Abandoned;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ScenarioState {
        ScenarioState::new(
            0,
            TestScenario::new("total", "int", "sums positive amounts"),
            "InvoiceTmpTest0.java",
        )
    }

    #[test]
    fn test_scenario_deserializes_oracle_field_names() {
        let json = r#"{"testScenarios":[{"methodname":"total","returntype":"int","scenario":"empty cart"}]}"#;
        let list: ScenarioList = serde_json::from_str(json).unwrap();
        assert_eq!(list.test_scenarios.len(), 1);
        assert_eq!(list.test_scenarios[0].method_name, "total");
        assert_eq!(list.test_scenarios[0].description, "empty cart");
    }

    #[test]
    fn test_scenario_display_includes_description() {
        let s = TestScenario::new("total", "int", "empty cart");
        assert_eq!(
            s.to_string(),
            "TestScenario{methodname='total', returntype='int', scenario='empty cart'}"
        );
        assert_eq!(s.one_liner(), "total(): int");
    }

    #[test]
    fn test_new_state_is_pending() {
        let s = state();
        assert!(s.is_pending());
        assert_eq!(s.attempt_count, 0);
        assert!(s.current_source.is_none());
        assert!(!s.awaiting_compile);
    }

    #[test]
    fn test_candidate_then_reject_then_complete() {
        let mut s = state();
        s.accept_candidate("class A {}".to_string(), vec!["com.acme.Money".to_string()]);
        assert_eq!(s.attempt_count, 1);
        assert!(s.awaiting_compile);

        s.reject("COMPILATION_FAILED\ncannot find symbol".to_string());
        assert!(!s.awaiting_compile);
        assert!(s.is_pending());

        s.complete("class A {}".to_string());
        assert_eq!(s.status, ScenarioStatus::Completed);
        assert!(s.last_compile_error.is_empty());
        assert!(s.status.is_terminal());
    }

    #[test]
    fn test_budget() {
        let mut s = state();
        assert!(s.has_budget(1));
        s.record_failed_generation();
        assert!(!s.has_budget(1));
    }
}
