use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Default directory (under the output directory) for alignment artifacts.
pub const ALIGNMENT_DIR_NAME: &str = "pairwise_alignments";

/// Default directory (under the output directory) for coordinate artifacts.
pub const COORDINATE_DIR_NAME: &str = "pairwise_pdbs";

/// Scratch directory MUSTANG writes into before artifacts are moved into place.
pub const WORK_DIR_NAME: &str = ".mustang_work";

/// Where a batch puts its artifacts.
///
/// In strict mode MUSTANG writes into `work_dir` and both artifacts are moved
/// into `alignment_dir` / `coordinate_dir`. In lenient mode there is no
/// coordinate directory and `work_dir` is the alignment directory itself, so
/// alignments are only renamed in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub alignment_dir: Utf8PathBuf,
    pub coordinate_dir: Option<Utf8PathBuf>,
    pub work_dir: Utf8PathBuf,
}

impl OutputLayout {
    pub fn strict(
        output_dir: &Utf8Path,
        pairwise_dir: Option<&Utf8Path>,
        coordinate_dir: Option<&Utf8Path>,
    ) -> Self {
        Self {
            alignment_dir: pairwise_dir
                .map(Utf8Path::to_path_buf)
                .unwrap_or_else(|| output_dir.join(ALIGNMENT_DIR_NAME)),
            coordinate_dir: Some(
                coordinate_dir
                    .map(Utf8Path::to_path_buf)
                    .unwrap_or_else(|| output_dir.join(COORDINATE_DIR_NAME)),
            ),
            work_dir: output_dir.join(WORK_DIR_NAME),
        }
    }

    pub fn lenient(output_dir: &Utf8Path, pairwise_dir: Option<&Utf8Path>) -> Self {
        let alignment_dir = pairwise_dir
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|| output_dir.join(ALIGNMENT_DIR_NAME));
        Self {
            work_dir: alignment_dir.clone(),
            alignment_dir,
            coordinate_dir: None,
        }
    }

    pub fn keeps_coordinates(&self) -> bool {
        self.coordinate_dir.is_some()
    }

    /// Create every directory of the layout. Called once, before dispatch.
    pub fn create_dirs(&self) -> Result<()> {
        let dirs = [
            Some(&self.alignment_dir),
            self.coordinate_dir.as_ref(),
            Some(&self.work_dir),
        ];

        for dir in dirs.into_iter().flatten() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir))?;
        }

        Ok(())
    }

    /// Remove the scratch directory once the batch is over, if nothing is left in it.
    pub fn remove_work_dir_if_empty(&self) {
        if self.work_dir == self.alignment_dir || !self.work_dir.exists() {
            return;
        }

        match fs::remove_dir(&self.work_dir) {
            Ok(()) => tracing::debug!("Removed work directory {}", self.work_dir),
            Err(e) => tracing::debug!("Keeping work directory {}: {}", self.work_dir, e),
        }
    }
}
