use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use std::process::Stdio;
use std::time::Instant;
use thiserror::Error;
use tokio::process::Command;

use crate::models::PairJob;

/// Errors that prevent MUSTANG from running at all.
///
/// A process that starts and then exits non-zero is not an error here; it is
/// reported through [`InvocationOutput::exit_code`].
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("MUSTANG executable not available at {path}: {source}")]
    ToolNotAvailable {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to run MUSTANG: {0}")]
    Process(#[from] io::Error),
}

/// What a finished MUSTANG process left behind besides its files.
#[derive(Debug, Clone)]
pub struct InvocationOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl InvocationOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs MUSTANG once per pair job.
///
/// The command shape is `<exe> -i <file1> <file2> -o <stem> -F <format>`.
#[derive(Debug, Clone)]
pub struct AlignmentInvoker {
    executable: Utf8PathBuf,
    alignment_format: String,
}

impl AlignmentInvoker {
    pub fn new(executable: impl Into<Utf8PathBuf>, alignment_format: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            alignment_format: alignment_format.into(),
        }
    }

    pub fn executable(&self) -> &Utf8Path {
        &self.executable
    }

    /// Arguments for aligning `job`, excluding the executable itself.
    pub fn build_args(&self, job: &PairJob) -> Vec<String> {
        vec![
            "-i".to_string(),
            job.first().path().to_string(),
            job.second().path().to_string(),
            "-o".to_string(),
            job.output_stem().to_string(),
            "-F".to_string(),
            self.alignment_format.clone(),
        ]
    }

    /// Run MUSTANG for `job` and wait for it to exit.
    ///
    /// The child is killed if this future is dropped before it completes.
    pub async fn invoke(&self, job: &PairJob) -> Result<InvocationOutput, InvokeError> {
        let args = self.build_args(job);
        tracing::debug!("Executing: {} {}", self.executable, args.join(" "));

        let start = Instant::now();

        let output = Command::new(self.executable.as_std_path())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                    InvokeError::ToolNotAvailable {
                        path: self.executable.clone(),
                        source: e,
                    }
                }
                _ => InvokeError::Process(e),
            })?;

        let exit_code = output.status.code();
        tracing::debug!(
            "MUSTANG finished {} in {:.2}s with exit code {:?}",
            job.id(),
            start.elapsed().as_secs_f32(),
            exit_code
        );

        Ok(InvocationOutput {
            exit_code,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
