use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::error::BatchError;
use crate::models::{AlignerSettings, BatchSummary, InputStructure, OutputLayout, PairJob};
use crate::services::aggregate::aggregate;
use crate::services::dispatcher::{JobDispatcher, ProgressSink};
use crate::services::inputs::{
    enumerate_inputs, ensure_unique_identifiers, ensure_unique_pair_ids, plan_jobs,
};
use crate::services::invoker::AlignmentInvoker;
use crate::services::reconcile::OutputReconciler;

/// What a batch aligns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchInput {
    /// Every structure file in the directory against every other, self pairs included.
    Directory(Utf8PathBuf),
    /// Exactly one alignment of the first file against the second.
    Pair(Utf8PathBuf, Utf8PathBuf),
}

/// Drives a batch end to end: enumerate, plan, dispatch, aggregate.
///
/// Diagnostics are emitted inside the span given to [`with_span`](Self::with_span)
/// (a fresh `batch` span by default), so callers decide where records go.
pub struct BatchRunner {
    settings: AlignerSettings,
    output_dir: Utf8PathBuf,
    concurrency: usize,
    span: tracing::Span,
}

impl BatchRunner {
    /// Create a runner, rejecting invalid settings up front.
    pub fn new(settings: AlignerSettings, output_dir: impl Into<Utf8PathBuf>) -> Result<Self, BatchError> {
        settings.validate()?;
        let concurrency = settings.concurrency_limit();
        Ok(Self {
            settings,
            output_dir: output_dir.into(),
            concurrency,
            span: tracing::info_span!("batch"),
        })
    }

    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Override the worker count derived from `cpu_percentage`.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn settings(&self) -> &AlignerSettings {
        &self.settings
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn layout(&self) -> OutputLayout {
        self.settings.output_layout(&self.output_dir)
    }

    pub async fn run(
        &self,
        input: &BatchInput,
        progress: &dyn ProgressSink,
    ) -> Result<BatchSummary, BatchError> {
        match input {
            BatchInput::Directory(dir) => self.run_all_vs_all(dir, progress).await,
            BatchInput::Pair(first, second) => self.run_pair(first, second, progress).await,
        }
    }

    /// Align every structure in `input_dir` against every structure, `N²` jobs.
    pub async fn run_all_vs_all(
        &self,
        input_dir: &Utf8Path,
        progress: &dyn ProgressSink,
    ) -> Result<BatchSummary, BatchError> {
        let inputs = {
            let _enter = self.span.enter();
            enumerate_inputs(input_dir, &self.settings.input_extension)?
        };

        if inputs.is_empty() {
            return Ok(BatchSummary::empty(self.layout()));
        }

        ensure_unique_identifiers(&inputs)?;

        let layout = Arc::new(self.layout());
        let jobs = plan_jobs(&inputs, &layout);
        ensure_unique_pair_ids(&jobs)?;
        self.execute(jobs, layout, progress).await
    }

    /// Align `first` against `second`, a single job.
    pub async fn run_pair(
        &self,
        first: &Utf8Path,
        second: &Utf8Path,
        progress: &dyn ProgressSink,
    ) -> Result<BatchSummary, BatchError> {
        let first = Arc::new(pair_input(first)?);
        let second = Arc::new(pair_input(second)?);

        let layout = Arc::new(self.layout());
        let jobs = vec![PairJob::new(first, second, Arc::clone(&layout))];
        self.execute(jobs, layout, progress).await
    }

    async fn execute(
        &self,
        jobs: Vec<PairJob>,
        layout: Arc<OutputLayout>,
        progress: &dyn ProgressSink,
    ) -> Result<BatchSummary, BatchError> {
        let start = Instant::now();
        let executable = self.preflight_tool()?;

        layout
            .create_dirs()
            .map_err(|e| BatchError::Io(std::io::Error::other(format!("{:#}", e))))?;

        let expected = jobs.len();
        let dispatcher = JobDispatcher::new(
            AlignmentInvoker::new(executable, self.settings.alignment_format.clone()),
            OutputReconciler::new(
                self.settings.reconcile_mode,
                self.settings.native_extension(),
                self.settings.alignment_format.clone(),
            ),
            self.concurrency,
        );

        let dispatched = dispatcher.dispatch(jobs, progress, &self.span).await;
        layout.remove_work_dir_if_empty();
        let results = dispatched?;

        let _enter = self.span.enter();
        Ok(aggregate(
            expected,
            &results,
            layout.as_ref().clone(),
            start.elapsed(),
        ))
    }

    /// The executable must exist before any job is scheduled.
    fn preflight_tool(&self) -> Result<Utf8PathBuf, BatchError> {
        let executable = self.settings.resolved_mustang_path();
        if executable.is_file() {
            Ok(executable)
        } else {
            tracing::error!(parent: &self.span, "MUSTANG executable not found at {}", executable);
            Err(BatchError::ToolNotAvailable(executable))
        }
    }
}

fn pair_input(path: &Utf8Path) -> Result<InputStructure, BatchError> {
    if !path.is_file() {
        return Err(BatchError::InvalidPair(path.to_path_buf()));
    }
    InputStructure::from_path(path).ok_or_else(|| BatchError::InvalidPair(path.to_path_buf()))
}
