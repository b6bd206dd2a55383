use std::time::Duration;

use super::layout::OutputLayout;

/// A pair that did not produce its artifacts, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPair {
    pub pair_id: String,
    pub reason: String,
}

/// Outcome of a whole batch. Built once after every job has finished.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    expected: usize,
    succeeded: usize,
    failures: Vec<FailedPair>,
    layout: OutputLayout,
    duration: Duration,
}

impl BatchSummary {
    pub fn new(
        expected: usize,
        succeeded: usize,
        failures: Vec<FailedPair>,
        layout: OutputLayout,
        duration: Duration,
    ) -> Self {
        Self {
            expected,
            succeeded,
            failures,
            layout,
            duration,
        }
    }

    /// Summary of a batch that had nothing to do.
    pub fn empty(layout: OutputLayout) -> Self {
        Self::new(0, 0, Vec::new(), layout, Duration::ZERO)
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failures(&self) -> &[FailedPair] {
        &self.failures
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// True when every expected pair produced its artifacts.
    pub fn is_complete(&self) -> bool {
        self.expected == self.succeeded
    }

    pub fn summary(&self) -> String {
        format!(
            "{}/{} pairwise alignments written to {} in {:.1}s",
            self.succeeded,
            self.expected,
            self.layout.alignment_dir,
            self.duration.as_secs_f64()
        )
    }
}
