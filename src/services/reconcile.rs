use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io;

use crate::models::{JobOutcome, PairJob, ReconcileMode};

/// Extensions of MUSTANG side outputs that are never kept.
const TRANSIENT_EXTENSIONS: &[&str] = &["html", "rms_rot"];

/// Coordinate artifact extension written by MUSTANG.
const COORDINATE_EXTENSION: &str = "pdb";

/// Checks what MUSTANG produced for a job and moves it into the canonical layout.
///
/// - **Strict**: the alignment and the coordinate file must both exist. Both are
///   moved out of the work directory; if either move fails nothing is left in
///   the canonical directories for that pair.
/// - **Lenient**: only the alignment file is required. It is renamed in place
///   to the requested format's extension and the coordinate file is deleted.
///
/// Existing artifacts with the same pair identifier are overwritten.
#[derive(Debug, Clone)]
pub struct OutputReconciler {
    mode: ReconcileMode,
    native_extension: String,
    format_extension: String,
}

impl OutputReconciler {
    pub fn new(
        mode: ReconcileMode,
        native_extension: impl Into<String>,
        format_extension: impl Into<String>,
    ) -> Self {
        Self {
            mode,
            native_extension: native_extension.into(),
            format_extension: format_extension.into(),
        }
    }

    pub fn mode(&self) -> ReconcileMode {
        self.mode
    }

    /// Validate and relocate the artifacts of a job whose MUSTANG run exited cleanly.
    pub fn reconcile(&self, job: &PairJob) -> JobOutcome {
        let outcome = match self.mode {
            ReconcileMode::Strict => self.reconcile_strict(job),
            ReconcileMode::Lenient => self.reconcile_lenient(job),
        };

        self.remove_transients(job);
        outcome
    }

    /// Clear every path this job's artifacts can occupy before MUSTANG runs.
    ///
    /// Reconciliation only checks for existence, so anything left by an
    /// earlier or aborted run would otherwise pass as this run's output.
    pub fn prepare(&self, job: &PairJob) {
        self.discard(job);
        remove_if_exists(&job.alignment_target(&self.format_extension));
        if let Some(coordinate_target) = job.coordinate_target() {
            remove_if_exists(&coordinate_target);
        }
    }

    /// Delete whatever a failed MUSTANG run left behind.
    ///
    /// In lenient mode with matching extensions the produced alignment is the
    /// canonical file, which is removed too.
    pub fn discard(&self, job: &PairJob) {
        remove_if_exists(&job.produced_artifact(&self.native_extension));
        remove_if_exists(&job.produced_artifact(COORDINATE_EXTENSION));
        self.remove_transients(job);
    }

    fn reconcile_strict(&self, job: &PairJob) -> JobOutcome {
        let produced_alignment = job.produced_artifact(&self.native_extension);
        let produced_coordinates = job.produced_artifact(COORDINATE_EXTENSION);

        for required in [&produced_alignment, &produced_coordinates] {
            if !required.exists() {
                tracing::error!(
                    "MUSTANG did not produce the expected output file: {}",
                    required
                );
                remove_if_exists(&produced_alignment);
                remove_if_exists(&produced_coordinates);
                return JobOutcome::ArtifactMissing {
                    path: required.clone(),
                };
            }
        }

        let alignment_target = job.alignment_target(&self.format_extension);
        let Some(coordinate_target) = job.coordinate_target() else {
            return JobOutcome::Io {
                message: format!(
                    "strict reconciliation of {} needs a coordinate directory",
                    job.id()
                ),
            };
        };

        if let Err(e) = replace_file(&produced_alignment, &alignment_target) {
            tracing::error!("Failed to move alignment for {}: {:#}", job.id(), e);
            remove_if_exists(&produced_coordinates);
            return JobOutcome::Io {
                message: format!("{:#}", e),
            };
        }

        if let Err(e) = replace_file(&produced_coordinates, &coordinate_target) {
            tracing::error!("Failed to move coordinates for {}: {:#}", job.id(), e);
            // Keep the canonical directories all-or-nothing for this pair.
            remove_if_exists(&alignment_target);
            remove_if_exists(&produced_coordinates);
            return JobOutcome::Io {
                message: format!("{:#}", e),
            };
        }

        JobOutcome::Succeeded {
            alignment: alignment_target,
            coordinates: Some(coordinate_target),
        }
    }

    fn reconcile_lenient(&self, job: &PairJob) -> JobOutcome {
        let produced_alignment = job.produced_artifact(&self.native_extension);
        let produced_coordinates = job.produced_artifact(COORDINATE_EXTENSION);

        if !produced_alignment.exists() {
            tracing::error!(
                "MUSTANG did not produce the expected alignment file: {}",
                produced_alignment
            );
            remove_if_exists(&produced_coordinates);
            return JobOutcome::ArtifactMissing {
                path: produced_alignment,
            };
        }

        let alignment_target = job.alignment_target(&self.format_extension);
        if produced_alignment != alignment_target {
            if let Err(e) = replace_file(&produced_alignment, &alignment_target) {
                tracing::error!("Failed to rename alignment for {}: {:#}", job.id(), e);
                remove_if_exists(&produced_coordinates);
                return JobOutcome::Io {
                    message: format!("{:#}", e),
                };
            }
        }

        remove_if_exists(&produced_coordinates);

        JobOutcome::Succeeded {
            alignment: alignment_target,
            coordinates: None,
        }
    }

    fn remove_transients(&self, job: &PairJob) {
        for extension in TRANSIENT_EXTENSIONS {
            remove_if_exists(&job.produced_artifact(extension));
        }
    }
}

/// Move `from` to `to`, replacing `to` if it already exists.
///
/// Falls back to copy-and-delete when a plain rename is not possible
/// (for example across filesystems).
pub fn replace_file(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    match fs::remove_file(to) {
        Ok(()) => tracing::debug!("Overwriting existing artifact {}", to),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to replace existing file: {}", to));
        }
    }

    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    fs::copy(from, to).with_context(|| format!("Failed to move {} to {}", from, to))?;
    fs::remove_file(from).with_context(|| format!("Failed to remove {} after copy", from))?;
    Ok(())
}

fn remove_if_exists(path: &Utf8Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed {}", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InputStructure, OutputLayout};
    use camino::Utf8PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        job: PairJob,
    }

    fn fixture(layout_for: impl Fn(&Utf8Path) -> OutputLayout) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let layout = layout_for(&root);
        layout.create_dirs().unwrap();

        let job = PairJob::new(
            Arc::new(InputStructure::from_path(root.join("a.pdb")).unwrap()),
            Arc::new(InputStructure::from_path(root.join("b.pdb")).unwrap()),
            Arc::new(layout),
        );

        Fixture {
            _temp_dir: temp_dir,
            job,
        }
    }

    fn strict() -> Fixture {
        fixture(|root| OutputLayout::strict(root, None, None))
    }

    fn lenient() -> Fixture {
        fixture(|root| OutputLayout::lenient(root, None))
    }

    fn produce(job: &PairJob, extension: &str) {
        fs::write(job.produced_artifact(extension), format!("{} {}", job.id(), extension)).unwrap();
    }

    #[test]
    fn test_strict_moves_both_artifacts() {
        let f = strict();
        produce(&f.job, "afasta");
        produce(&f.job, "pdb");
        produce(&f.job, "html");

        let reconciler = OutputReconciler::new(ReconcileMode::Strict, "afasta", "fasta");
        let outcome = reconciler.reconcile(&f.job);

        let alignment = f.job.alignment_target("fasta");
        let coordinates = f.job.coordinate_target().unwrap();
        assert_eq!(
            outcome,
            JobOutcome::Succeeded {
                alignment: alignment.clone(),
                coordinates: Some(coordinates.clone()),
            }
        );
        assert_eq!(fs::read_to_string(&alignment).unwrap(), "a_b afasta");
        assert!(coordinates.exists());
        assert!(!f.job.produced_artifact("afasta").exists());
        assert!(!f.job.produced_artifact("pdb").exists());
        assert!(!f.job.produced_artifact("html").exists());
    }

    #[test]
    fn test_strict_missing_coordinates_leaves_no_partial_alignment() {
        let f = strict();
        produce(&f.job, "afasta");

        let reconciler = OutputReconciler::new(ReconcileMode::Strict, "afasta", "fasta");
        let outcome = reconciler.reconcile(&f.job);

        assert_eq!(
            outcome,
            JobOutcome::ArtifactMissing {
                path: f.job.produced_artifact("pdb"),
            }
        );
        assert!(!f.job.alignment_target("fasta").exists());
        assert!(!f.job.produced_artifact("afasta").exists());
    }

    #[test]
    fn test_strict_missing_alignment() {
        let f = strict();
        produce(&f.job, "pdb");

        let reconciler = OutputReconciler::new(ReconcileMode::Strict, "afasta", "fasta");
        assert_eq!(
            reconciler.reconcile(&f.job),
            JobOutcome::ArtifactMissing {
                path: f.job.produced_artifact("afasta"),
            }
        );
        assert!(!f.job.coordinate_target().unwrap().exists());
    }

    #[test]
    fn test_strict_overwrites_previous_run() {
        let f = strict();
        fs::write(f.job.alignment_target("fasta"), "stale").unwrap();
        produce(&f.job, "afasta");
        produce(&f.job, "pdb");

        let reconciler = OutputReconciler::new(ReconcileMode::Strict, "afasta", "fasta");
        assert!(reconciler.reconcile(&f.job).is_success());
        assert_eq!(
            fs::read_to_string(f.job.alignment_target("fasta")).unwrap(),
            "a_b afasta"
        );
    }

    #[test]
    fn test_lenient_renames_in_place_and_drops_coordinates() {
        let f = lenient();
        produce(&f.job, "afasta");
        produce(&f.job, "pdb");

        let reconciler = OutputReconciler::new(ReconcileMode::Lenient, "afasta", "fasta");
        let outcome = reconciler.reconcile(&f.job);

        let alignment = f.job.alignment_target("fasta");
        assert_eq!(
            outcome,
            JobOutcome::Succeeded {
                alignment: alignment.clone(),
                coordinates: None,
            }
        );
        assert!(alignment.exists());
        assert!(!f.job.produced_artifact("afasta").exists());
        assert!(!f.job.produced_artifact("pdb").exists());
    }

    #[test]
    fn test_lenient_same_extension_needs_no_rename() {
        let f = lenient();
        produce(&f.job, "msf");

        let reconciler = OutputReconciler::new(ReconcileMode::Lenient, "msf", "msf");
        assert!(reconciler.reconcile(&f.job).is_success());
        assert!(f.job.alignment_target("msf").exists());
    }

    #[test]
    fn test_lenient_missing_alignment() {
        let f = lenient();
        produce(&f.job, "pdb");

        let reconciler = OutputReconciler::new(ReconcileMode::Lenient, "afasta", "fasta");
        assert!(matches!(
            reconciler.reconcile(&f.job),
            JobOutcome::ArtifactMissing { .. }
        ));
        assert!(!f.job.produced_artifact("pdb").exists());
    }

    #[test]
    fn test_prepare_clears_stale_artifacts() {
        let f = strict();
        produce(&f.job, "afasta");
        produce(&f.job, "pdb");
        fs::write(f.job.alignment_target("fasta"), "old").unwrap();
        fs::write(f.job.coordinate_target().unwrap(), "old").unwrap();

        let reconciler = OutputReconciler::new(ReconcileMode::Strict, "afasta", "fasta");
        reconciler.prepare(&f.job);

        assert!(!f.job.produced_artifact("afasta").exists());
        assert!(!f.job.produced_artifact("pdb").exists());
        assert!(!f.job.alignment_target("fasta").exists());
        assert!(!f.job.coordinate_target().unwrap().exists());

        // Nothing left over means nothing to reconcile
        assert!(matches!(
            reconciler.reconcile(&f.job),
            JobOutcome::ArtifactMissing { .. }
        ));
    }

    #[test]
    fn test_discard_removes_lenient_in_place_alignment() {
        let f = lenient();
        produce(&f.job, "msf");

        let reconciler = OutputReconciler::new(ReconcileMode::Lenient, "msf", "msf");
        reconciler.discard(&f.job);

        assert!(!f.job.alignment_target("msf").exists());
    }

    #[test]
    fn test_discard_cleans_work_dir() {
        let f = strict();
        produce(&f.job, "afasta");
        produce(&f.job, "html");

        let reconciler = OutputReconciler::new(ReconcileMode::Strict, "afasta", "fasta");
        reconciler.discard(&f.job);

        assert!(!f.job.produced_artifact("afasta").exists());
        assert!(!f.job.produced_artifact("html").exists());
    }
}
