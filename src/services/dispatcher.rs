use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::error::BatchError;
use crate::models::{JobOutcome, JobResult, JobState, PairJob};
use crate::services::invoker::{AlignmentInvoker, InvokeError};
use crate::services::reconcile::OutputReconciler;

/// Receives progress notifications from the dispatcher.
///
/// `advance` is called exactly once per finished job, whatever its outcome.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressSink {
    fn start(&self, total: u64);
    fn advance(&self, pair_id: &str, succeeded: bool);
    fn finish(&self);
}

/// Progress sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&self, _total: u64) {}
    fn advance(&self, _pair_id: &str, _succeeded: bool) {}
    fn finish(&self) {}
}

/// Terminal progress bar.
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    pub fn new() -> Self {
        let bar = ProgressBar::hidden();
        bar.set_message("Aligning pairs");
        Self { bar }
    }
}

impl Default for ProgressBarSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressBarSink {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg}: [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            self.bar.set_style(style);
        }
    }

    fn advance(&self, _pair_id: &str, _succeeded: bool) {
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish();
    }
}

/// Bounded worker pool that runs the invoke-then-reconcile pipeline for each job.
///
/// At most `concurrency` MUSTANG processes run at once. Results come back in
/// completion order, not submission order.
pub struct JobDispatcher {
    invoker: Arc<AlignmentInvoker>,
    reconciler: Arc<OutputReconciler>,
    concurrency: usize,
}

impl JobDispatcher {
    pub fn new(invoker: AlignmentInvoker, reconciler: OutputReconciler, concurrency: usize) -> Self {
        Self {
            invoker: Arc::new(invoker),
            reconciler: Arc::new(reconciler),
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every job and collect the results.
    ///
    /// Per-job failures become failed [`JobResult`]s. If a worker finds the
    /// MUSTANG executable cannot be started, the remaining jobs are aborted
    /// (their processes are killed) and [`BatchError::ToolNotAvailable`] is returned.
    pub async fn dispatch(
        &self,
        jobs: Vec<PairJob>,
        progress: &dyn ProgressSink,
        span: &tracing::Span,
    ) -> Result<Vec<JobResult>, BatchError> {
        let total = jobs.len();
        progress.start(total as u64);

        tracing::info!(
            parent: span,
            "Dispatching {} pair jobs to {} (max concurrent: {}, {:?} reconciliation)",
            total,
            self.invoker.executable(),
            self.concurrency,
            self.reconciler.mode()
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut pair_ids = HashMap::with_capacity(total);

        for job in jobs {
            let pair_id = job.id().to_string();
            let job_span = tracing::info_span!(parent: span, "pair", id = %pair_id);
            let invoker = Arc::clone(&self.invoker);
            let reconciler = Arc::clone(&self.reconciler);
            let semaphore = Arc::clone(&semaphore);

            let handle = tasks.spawn(
                async move {
                    // The permit is held until the job's result is returned.
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return JobResult::new(
                                job.id(),
                                JobOutcome::Crashed {
                                    message: e.to_string(),
                                },
                                Default::default(),
                            );
                        }
                    };
                    run_job(&invoker, &reconciler, &job).await
                }
                .instrument(job_span),
            );
            pair_ids.insert(handle.id(), pair_id);
        }

        let mut results = Vec::with_capacity(total);

        while let Some(joined) = tasks.join_next_with_id().await {
            let result = match joined {
                Ok((_, result)) => result,
                Err(e) => {
                    let pair_id = pair_ids.get(&e.id()).cloned().unwrap_or_default();
                    tracing::error!(parent: span, "Worker for {} failed: {}", pair_id, e);
                    JobResult::new(
                        pair_id,
                        JobOutcome::Crashed {
                            message: e.to_string(),
                        },
                        Default::default(),
                    )
                }
            };

            progress.advance(result.pair_id(), result.succeeded());
            if let Some((alignment, _)) = result.artifacts() {
                tracing::debug!(
                    parent: span,
                    "{} aligned in {:.2}s: {}",
                    result.pair_id(),
                    result.duration().as_secs_f32(),
                    alignment
                );
            }

            if let JobOutcome::ToolUnavailable { path } = result.outcome() {
                let path = path.clone();
                tasks.abort_all();
                progress.finish();
                tracing::error!(
                    parent: span,
                    "MUSTANG executable not available at {}, aborting {} outstanding jobs",
                    path,
                    tasks.len()
                );
                return Err(BatchError::ToolNotAvailable(path));
            }

            results.push(result);
        }

        progress.finish();
        Ok(results)
    }
}

/// One job, start to finish: `Pending -> Invoked -> {Succeeded, Failed}`.
async fn run_job(
    invoker: &AlignmentInvoker,
    reconciler: &OutputReconciler,
    job: &PairJob,
) -> JobResult {
    let start = Instant::now();
    let state = JobState::Pending;

    reconciler.prepare(job);

    let output = match invoker.invoke(job).await {
        Ok(output) => output,
        Err(InvokeError::ToolNotAvailable { path, source }) => {
            tracing::error!("MUSTANG executable not available at {}: {}", path, source);
            return finish(job, state, JobOutcome::ToolUnavailable { path }, start);
        }
        Err(InvokeError::Process(e)) => {
            tracing::error!(
                "Error processing {} and {}: {}",
                job.first().path(),
                job.second().path(),
                e
            );
            reconciler.discard(job);
            let outcome = JobOutcome::Io {
                message: e.to_string(),
            };
            return finish(job, state, outcome, start);
        }
    };

    let state = advance(job, state, JobState::Invoked);

    if !output.success() {
        tracing::error!(
            "MUSTANG failed for {} and {}: {}",
            job.first().path(),
            job.second().path(),
            output.stderr.trim()
        );
        reconciler.discard(job);
        let outcome = JobOutcome::ToolFailed {
            exit_code: output.exit_code,
            stderr: output.stderr,
        };
        return finish(job, state, outcome, start);
    }

    let outcome = reconciler.reconcile(job);
    finish(job, state, outcome, start)
}

fn finish(job: &PairJob, state: JobState, outcome: JobOutcome, start: Instant) -> JobResult {
    let terminal = if outcome.is_success() {
        JobState::Succeeded
    } else {
        JobState::Failed
    };
    advance(job, state, terminal);
    JobResult::new(job.id(), outcome, start.elapsed())
}

fn advance(job: &PairJob, from: JobState, to: JobState) -> JobState {
    match from.transition(to) {
        Ok(state) => {
            tracing::trace!("{}: {:?} -> {:?}", job.id(), from, state);
            state
        }
        Err(e) => {
            tracing::warn!("{}: {}", job.id(), e);
            from
        }
    }
}
