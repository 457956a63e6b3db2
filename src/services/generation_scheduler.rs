//! Bulk job: runs the CUT pipeline over a list of classes, one at a time.

use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BulkReport, BulkStatus, ClassUnderTest, CutOutcome, CutReport};
use crate::domain::ports::{FileStoreProvider, ProgressReporter};
use crate::services::cut_pipeline::CutPipeline;

pub struct GenerationScheduler {
    pipeline: Arc<CutPipeline>,
    stores: Arc<dyn FileStoreProvider>,
}

impl GenerationScheduler {
    pub fn new(pipeline: Arc<CutPipeline>, stores: Arc<dyn FileStoreProvider>) -> Self {
        Self { pipeline, stores }
    }

    /// Process `cuts` strictly in order.
    ///
    /// Cancellation is honored before each CUT; artifacts already produced
    /// are left untouched. A failing or panicking CUT is logged and recorded,
    /// and the job moves on to the next one.
    #[instrument(skip_all, fields(total = cuts.len()))]
    pub async fn run(&self, cuts: &[ClassUnderTest], progress: &dyn ProgressReporter) -> BulkReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = cuts.len();
        let mut reports = Vec::with_capacity(total);
        let mut status = BulkStatus::Completed;

        info!(%run_id, total, "Starting test generation");

        for (processed, cut) in cuts.iter().enumerate() {
            if progress.is_canceled() {
                info!(processed, "Test generation canceled");
                status = BulkStatus::Canceled;
                break;
            }

            progress.set_fraction(fraction(processed, total));
            progress.set_text(&format!(
                "Generating tests for {} ({}/{total})",
                cut.qualified_name(),
                processed + 1
            ));

            let outcome = AssertUnwindSafe(self.process_one(cut, progress))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    Err(DomainError::ExecutionFailed(format!(
                        "panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                });
            let report = match outcome {
                Ok(report) => report,
                Err(e) => {
                    error!(cut = %cut.qualified_name(), kind = e.kind(), error = %e, "Test generation failed");
                    CutReport::failed(cut.qualified_name(), e.kind(), e.to_string())
                }
            };
            let canceled = report.outcome == CutOutcome::Canceled;
            reports.push(report);

            progress.set_fraction(fraction(processed + 1, total));
            progress.set_text(&format!("Finished {}", cut.qualified_name()));

            if canceled {
                status = BulkStatus::Canceled;
                break;
            }
        }

        let report = BulkReport {
            run_id,
            status,
            total,
            started_at,
            finished_at: Utc::now(),
            cuts: reports,
        };

        if status == BulkStatus::Completed {
            let message = format!(
                "Generated tests for {} of {total} classes",
                report.generated()
            );
            info!(
                %run_id,
                generated = report.generated(),
                failed = report.failed(),
                "Test generation completed"
            );
            progress.finish(&message);
        }
        report
    }

    async fn process_one(
        &self,
        cut: &ClassUnderTest,
        progress: &dyn ProgressReporter,
    ) -> DomainResult<CutReport> {
        let store = self.stores.open_package(&cut.package).await?;
        self.pipeline.process(cut, &store, progress).await
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[allow(clippy::cast_precision_loss)]
fn fraction(done: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        done as f64 / total as f64
    }
}
