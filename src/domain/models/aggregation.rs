//! State of the final-artifact merge loop.

use serde::{Deserialize, Serialize};

/// Mutable state of the aggregation retry loop for one CUT.
#[derive(Debug, Clone, Default)]
pub struct AggregationState {
    /// File name of the final test artifact, e.g. `InvoiceTest.java`
    pub final_artifact_name: String,

    /// Source of the last produced (or pre-existing) final artifact
    pub current_source: Option<String>,

    /// Diagnostic text of the last compile or test run, empty when clean
    pub last_error: String,

    /// Oracle calls spent so far
    pub attempt_count: u32,
}

impl AggregationState {
    pub fn new(final_artifact_name: impl Into<String>) -> Self {
        Self {
            final_artifact_name: final_artifact_name.into(),
            ..Default::default()
        }
    }
}

/// How the aggregation loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationOutcome {
    /// Final artifact compiled (and passed, when test execution is on)
    Succeeded,
    /// Budget spent; the last artifact is retained as best effort
    Exhausted,
    /// Stopped between attempts because the job was canceled
    Canceled,
}

/// Summary of one aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationReport {
    pub outcome: AggregationOutcome,
    pub final_artifact_name: String,
    pub attempts: u32,
    pub inputs: usize,
    /// Last diagnostic text, empty on success
    pub last_error: String,
}

impl AggregationReport {
    pub fn from_state(state: &AggregationState, outcome: AggregationOutcome, inputs: usize) -> Self {
        Self {
            outcome,
            final_artifact_name: state.final_artifact_name.clone(),
            attempts: state.attempt_count,
            inputs,
            last_error: state.last_error.clone(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == AggregationOutcome::Succeeded
    }
}
