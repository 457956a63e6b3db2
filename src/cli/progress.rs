//! Terminal progress reporting for the bulk job
//!
//! Wraps an indicatif bar behind the [`ProgressReporter`] port and carries
//! the cancel flag that Ctrl-C sets.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::ports::ProgressReporter;

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {percent:>3}% {msg}";
const PROGRESS_CHARS: &str = "█▓▒░ ";

/// Resolution of the underlying bar; fractions are mapped onto it.
const STEPS: u64 = 1000;

pub struct TerminalProgress {
    bar: ProgressBar,
    text: Mutex<String>,
    canceled: AtomicBool,
}

impl TerminalProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(STEPS);
        let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
            .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars(PROGRESS_CHARS));
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self::with_bar(bar)
    }

    /// A reporter that draws nothing, for `--json` runs.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            text: Mutex::new(String::new()),
            canceled: AtomicBool::new(false),
        }
    }

    /// Request cancellation; the job stops at its next checkpoint.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
        self.bar.set_message("Canceling after the current step...");
    }

    /// Leave the bar in place with a final message, without marking it done.
    pub fn abandon(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for TerminalProgress {
    fn set_text(&self, text: &str) {
        if let Ok(mut current) = self.text.lock() {
            *current = text.to_string();
        }
        self.bar.set_message(text.to_string());
    }

    fn set_detail(&self, detail: &str) {
        let text = self.text.lock().map(|t| t.clone()).unwrap_or_default();
        if text.is_empty() {
            self.bar.set_message(detail.to_string());
        } else {
            self.bar.set_message(format!("{text}: {detail}"));
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn set_fraction(&self, fraction: f64) {
        let position = (fraction.clamp(0.0, 1.0) * STEPS as f64).round() as u64;
        self.bar.set_position(position);
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    fn finish(&self, message: &str) {
        self.bar.finish_with_message(format!("✓ {message}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_maps_to_position() {
        let progress = TerminalProgress::hidden();
        progress.set_fraction(0.5);
        assert_eq!(progress.position(), 500);
        progress.set_fraction(2.0);
        assert_eq!(progress.position(), STEPS);
    }

    #[test]
    fn test_cancel_flag() {
        let progress = TerminalProgress::hidden();
        assert!(!progress.is_canceled());
        progress.cancel();
        assert!(progress.is_canceled());
    }
}
