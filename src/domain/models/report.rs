//! Reports produced by the synthesizers and the bulk scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregation::AggregationReport;
use super::scenario::{ScenarioState, ScenarioStatus};

/// Result of driving a CUT's scenarios through the round loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisReport {
    /// Indices of Completed scenarios, in extraction order
    pub completed: Vec<usize>,
    /// Indices of Abandoned scenarios, in extraction order
    pub abandoned: Vec<usize>,
    /// Rounds executed in this run
    pub rounds: u32,
    /// Oracle calls issued in this run
    pub oracle_calls: u32,
    /// Compiles issued in this run
    pub compiles: u32,
    /// The run stopped early on cancellation
    pub canceled: bool,
}

impl SynthesisReport {
    /// Recompute the completed/abandoned partition from the states.
    pub fn collect_statuses(&mut self, states: &[ScenarioState]) {
        self.completed = indices_with(states, ScenarioStatus::Completed);
        self.abandoned = indices_with(states, ScenarioStatus::Abandoned);
    }

    pub fn total(&self) -> usize {
        self.completed.len() + self.abandoned.len()
    }
}

fn indices_with(states: &[ScenarioState], status: ScenarioStatus) -> Vec<usize> {
    states
        .iter()
        .filter(|s| s.status == status)
        .map(|s| s.index)
        .collect()
}

/// Terminal outcome for one CUT within a bulk job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CutOutcome {
    /// Final artifact compiled cleanly
    Generated,
    /// Aggregation budget spent; best-effort artifact left in place
    BestEffort,
    /// Processing stopped by cancellation mid-CUT
    Canceled,
    /// Processing aborted by an error; other CUTs are unaffected
    Failed { kind: String, message: String },
}

/// Per-CUT entry of a bulk report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutReport {
    pub cut: String,
    pub outcome: CutOutcome,
    pub scenarios: usize,
    pub completed: usize,
    pub abandoned: usize,
    pub final_artifact: Option<String>,
    pub aggregation: Option<AggregationReport>,
}

impl CutReport {
    pub fn failed(cut: impl Into<String>, kind: &str, message: impl Into<String>) -> Self {
        Self {
            cut: cut.into(),
            outcome: CutOutcome::Failed {
                kind: kind.to_string(),
                message: message.into(),
            },
            scenarios: 0,
            completed: 0,
            abandoned: 0,
            final_artifact: None,
            aggregation: None,
        }
    }
}

/// How a bulk job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkStatus {
    Completed,
    Canceled,
}

/// Summary of a whole bulk invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkReport {
    pub run_id: Uuid,
    pub status: BulkStatus,
    pub total: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cuts: Vec<CutReport>,
}

impl BulkReport {
    pub fn processed(&self) -> usize {
        self.cuts.len()
    }

    pub fn count(&self, pred: impl Fn(&CutOutcome) -> bool) -> usize {
        self.cuts.iter().filter(|c| pred(&c.outcome)).count()
    }

    pub fn generated(&self) -> usize {
        self.count(|o| matches!(o, CutOutcome::Generated))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CutOutcome::Failed { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TestScenario;

    #[test]
    fn test_collect_statuses_partitions_by_index() {
        let mut states: Vec<ScenarioState> = (0..3)
            .map(|i| ScenarioState::new(i, TestScenario::new("m", "void", "d"), format!("T{i}")))
            .collect();
        states[0].complete("a".to_string());
        states[1].abandon();
        states[2].complete("c".to_string());

        let mut report = SynthesisReport::default();
        report.collect_statuses(&states);
        assert_eq!(report.completed, vec![0, 2]);
        assert_eq!(report.abandoned, vec![1]);
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_failed_cut_report_serializes_kind() {
        let report = CutReport::failed("com.acme.Invoice", "extraction_failed", "bad json");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["status"], "failed");
        assert_eq!(json["outcome"]["kind"], "extraction_failed");
    }
}
