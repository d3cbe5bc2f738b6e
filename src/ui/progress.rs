//! Progress display for feature runs

use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter for a run over many features
///
/// - Interactive progress bar (default)
/// - Silent no-op for `--quiet` and tests
pub trait ProgressReporter {
    /// Start a run over `total` features
    fn start(&mut self, phase: &str, total: usize);

    /// Show the feature currently running
    fn feature(&mut self, name: &str, current: usize, total: usize);

    /// Mark the current feature done
    fn inc(&mut self);

    fn finish(&mut self);

    /// Abandon on error or interrupt
    fn abandon(&mut self);
}

/// Progress bar on stderr
///
/// indicatif hides the bar by itself when stderr is not a terminal.
#[derive(Default)]
pub struct InteractiveProgressReporter {
    bar: Option<ProgressBar>,
}

impl InteractiveProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for InteractiveProgressReporter {
    fn start(&mut self, phase: &str, total: usize) {
        let style = ProgressStyle::default_bar()
            .template("{prefix:>8.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let bar = ProgressBar::new(total as u64);
        bar.set_style(style);
        bar.set_prefix(phase.to_string());
        self.bar = Some(bar);
    }

    fn feature(&mut self, name: &str, current: usize, total: usize) {
        if let Some(ref bar) = self.bar {
            bar.set_message(format!("({current}/{total}) {name}"));
        }
    }

    fn inc(&mut self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn abandon(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.abandon();
        }
    }
}

#[derive(Debug, Default)]
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn start(&mut self, _phase: &str, _total: usize) {}

    fn feature(&mut self, _name: &str, _current: usize, _total: usize) {}

    fn inc(&mut self) {}

    fn finish(&mut self) {}

    fn abandon(&mut self) {}
}
