use std::time::Duration;

use crate::models::{BatchSummary, FailedPair, JobResult, OutputLayout};

/// Reduce the per-job results of a batch to its [`BatchSummary`].
///
/// Purely observational: a count mismatch is logged as a warning and never
/// changes any job's status or touches the filesystem.
pub fn aggregate(
    expected: usize,
    results: &[JobResult],
    layout: OutputLayout,
    duration: Duration,
) -> BatchSummary {
    let succeeded = results.iter().filter(|r| r.succeeded()).count();

    let mut failures: Vec<FailedPair> = results
        .iter()
        .filter_map(|r| {
            r.error().map(|reason| FailedPair {
                pair_id: r.pair_id().to_string(),
                reason,
            })
        })
        .collect();
    failures.sort_by(|a, b| a.pair_id.cmp(&b.pair_id));

    if succeeded != expected {
        tracing::warn!(
            "Mismatch in alignment file count. Expected: {}, Actual: {}",
            expected,
            succeeded
        );
    }

    BatchSummary::new(expected, succeeded, failures, layout, duration)
}
