use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::layout::OutputLayout;

/// Joins the two structure identifiers of a pair into its output identifier.
pub const PAIR_SEPARATOR: char = '_';

/// A structure file discovered on disk together with its short identifier.
///
/// The identifier is the file name without its final extension
/// (`1abc.pdb` -> `1abc`). Instances are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputStructure {
    path: Utf8PathBuf,
    id: String,
}

impl InputStructure {
    /// Build an input from a path, returning `None` when the path has no file stem.
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Option<Self> {
        let path = path.into();
        let id = path.file_stem()?.to_string();
        if id.is_empty() {
            return None;
        }
        Some(Self { path, id })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// One unit of work: align `first` against `second`.
///
/// Jobs are created at plan time, handed to exactly one worker, and never
/// mutated afterwards. Both inputs are shared with every other job that
/// references them.
#[derive(Debug, Clone)]
pub struct PairJob {
    first: Arc<InputStructure>,
    second: Arc<InputStructure>,
    id: String,
    layout: Arc<OutputLayout>,
}

impl PairJob {
    pub fn new(
        first: Arc<InputStructure>,
        second: Arc<InputStructure>,
        layout: Arc<OutputLayout>,
    ) -> Self {
        let id = format!("{}{}{}", first.id(), PAIR_SEPARATOR, second.id());
        Self {
            first,
            second,
            id,
            layout,
        }
    }

    pub fn first(&self) -> &InputStructure {
        &self.first
    }

    pub fn second(&self) -> &InputStructure {
        &self.second
    }

    /// Output identifier, `<first id>_<second id>`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Stem handed to the aligner's `-o` flag. The tool appends its own extensions.
    pub fn output_stem(&self) -> Utf8PathBuf {
        self.layout.work_dir.join(&self.id)
    }

    /// A file the aligner writes next to the output stem, e.g. `produced_artifact("pdb")`.
    pub fn produced_artifact(&self, extension: &str) -> Utf8PathBuf {
        self.layout.work_dir.join(format!("{}.{}", self.id, extension))
    }

    /// Final location of the alignment artifact.
    pub fn alignment_target(&self, extension: &str) -> Utf8PathBuf {
        self.layout
            .alignment_dir
            .join(format!("{}.{}", self.id, extension))
    }

    /// Final location of the coordinate artifact, if the layout keeps coordinates.
    pub fn coordinate_target(&self) -> Option<Utf8PathBuf> {
        self.layout
            .coordinate_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.pdb", self.id)))
    }
}

/// Lifecycle of a single job: `Pending -> Invoked -> {Succeeded, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Invoked,
    Succeeded,
    Failed,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid job state transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: JobState,
    pub to: JobState,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// Move to `to`, rejecting anything but the forward edges of the lifecycle.
    ///
    /// A job that never got as far as running its subprocess (for example,
    /// the executable could not be spawned) goes straight from `Pending`
    /// to `Failed`.
    pub fn transition(self, to: JobState) -> Result<JobState, InvalidTransition> {
        let allowed = matches!(
            (self, to),
            (JobState::Pending, JobState::Invoked)
                | (JobState::Pending, JobState::Failed)
                | (JobState::Invoked, JobState::Succeeded)
                | (JobState::Invoked, JobState::Failed)
        );

        if allowed {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// All required artifacts were produced and moved into place.
    Succeeded {
        alignment: Utf8PathBuf,
        coordinates: Option<Utf8PathBuf>,
    },

    /// The aligner ran but exited unsuccessfully.
    ToolFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The aligner exited cleanly but a required artifact is missing.
    ArtifactMissing { path: Utf8PathBuf },

    /// The aligner executable could not be started at all.
    ToolUnavailable { path: Utf8PathBuf },

    /// Filesystem error while relocating artifacts.
    Io { message: String },

    /// The worker itself died before producing a result.
    Crashed { message: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded { .. })
    }

    /// Human-readable failure cause, `None` for successes.
    pub fn error_description(&self) -> Option<String> {
        match self {
            JobOutcome::Succeeded { .. } => None,
            JobOutcome::ToolFailed { exit_code, stderr } => {
                let code = exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    Some(format!("MUSTANG exited with {}", code))
                } else {
                    Some(format!("MUSTANG exited with {}: {}", code, stderr))
                }
            }
            JobOutcome::ArtifactMissing { path } => {
                Some(format!("Expected output file not produced: {}", path))
            }
            JobOutcome::ToolUnavailable { path } => {
                Some(format!("MUSTANG executable not available at {}", path))
            }
            JobOutcome::Io { message } => Some(format!("I/O error: {}", message)),
            JobOutcome::Crashed { message } => Some(format!("Worker crashed: {}", message)),
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_description() {
            Some(description) => f.write_str(&description),
            None => f.write_str("succeeded"),
        }
    }
}

/// Result of one pair job, produced by a worker and consumed by the aggregator.
#[derive(Debug, Clone)]
pub struct JobResult {
    pair_id: String,
    outcome: JobOutcome,
    duration: Duration,
}

impl JobResult {
    pub fn new(pair_id: impl Into<String>, outcome: JobOutcome, duration: Duration) -> Self {
        Self {
            pair_id: pair_id.into(),
            outcome,
            duration,
        }
    }

    pub fn pair_id(&self) -> &str {
        &self.pair_id
    }

    pub fn outcome(&self) -> &JobOutcome {
        &self.outcome
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn succeeded(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn error(&self) -> Option<String> {
        self.outcome.error_description()
    }

    /// Terminal state of the job this result belongs to.
    pub fn state(&self) -> JobState {
        if self.succeeded() {
            JobState::Succeeded
        } else {
            JobState::Failed
        }
    }

    /// Final artifact locations; `None` unless the job succeeded.
    pub fn artifacts(&self) -> Option<(&Utf8Path, Option<&Utf8Path>)> {
        match &self.outcome {
            JobOutcome::Succeeded {
                alignment,
                coordinates,
            } => Some((alignment.as_path(), coordinates.as_deref())),
            _ => None,
        }
    }
}
