//! Terminal progress reporting backed by indicatif.

use indicatif::{ProgressBar, ProgressStyle};
use lanestack_core::Progress;

const TEMPLATE: &str = "{prefix:.bold} {msg} [{bar:30}] {pos}/{len}";

/// [`Progress`] implementation drawing a terminal bar. Quiet mode keeps the
/// bar hidden while task labels still reach the log.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Progress for BarProgress {
    fn set_task(&mut self, task: &str, subtask: &str) {
        self.bar.set_prefix(task.to_string());
        self.bar.set_message(subtask.to_string());
        self.bar.set_position(0);
    }

    fn set_subtask(&mut self, subtask: &str) {
        self.bar.set_message(subtask.to_string());
    }

    fn set_maximum(&mut self, maximum: u64) {
        self.bar.set_length(maximum);
    }

    fn set_progress(&mut self, value: u64) {
        self.bar.set_position(value);
    }

    fn increment(&mut self) {
        self.bar.inc(1);
    }
}
