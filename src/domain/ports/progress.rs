//! Progress reporting and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};

/// Sink for bulk job progress, also the source of the cancel signal.
pub trait ProgressReporter: Send + Sync {
    /// Main status line.
    fn set_text(&self, text: &str);

    /// Secondary status line.
    fn set_detail(&self, detail: &str);

    /// Overall completion in `0.0..=1.0`.
    fn set_fraction(&self, fraction: f64);

    /// Whether the operator asked to stop.
    fn is_canceled(&self) -> bool;

    /// Single completion signal for the whole job.
    fn finish(&self, message: &str);
}

/// Reporter that discards progress and cancels only on request.
#[derive(Debug, Default)]
pub struct SilentProgress {
    canceled: AtomicBool,
}

impl SilentProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }
}

impl ProgressReporter for SilentProgress {
    fn set_text(&self, _text: &str) {}

    fn set_detail(&self, _detail: &str) {}

    fn set_fraction(&self, _fraction: f64) {}

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    fn finish(&self, _message: &str) {}
}
