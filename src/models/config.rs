use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::layout::OutputLayout;
use crate::error::BatchError;

/// File name of the MUSTANG binary shipped alongside this tool.
pub const BUNDLED_MUSTANG_NAME: &str = "mustang-3.2.4";

/// How strictly the artifacts of a finished MUSTANG run are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMode {
    /// Alignment and coordinate files are both required and both kept.
    #[default]
    Strict,
    /// Only the alignment file is required; coordinate files are discarded.
    Lenient,
}

/// Settings for a batch of pairwise alignments.
///
/// Loaded from YAML by [`ConfigManager`](crate::config::ConfigManager);
/// command line flags are applied on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignerSettings {
    /// Path to the MUSTANG executable. `None` means the bundled binary.
    #[serde(default)]
    pub mustang_path: Option<Utf8PathBuf>,

    /// Alignment format code passed to `-F`.
    #[serde(default = "default_alignment_format")]
    pub alignment_format: String,

    /// Share of the available CPUs used for parallel jobs, in percent.
    #[serde(default = "default_cpu_percentage")]
    pub cpu_percentage: f64,

    #[serde(default)]
    pub reconcile_mode: ReconcileMode,

    /// Extension of the structure files picked up from the input directory.
    #[serde(default = "default_input_extension")]
    pub input_extension: String,

    /// Extension MUSTANG itself writes for a format code, when it differs from the code.
    #[serde(default = "default_native_extensions")]
    pub native_extensions: IndexMap<String, String>,

    /// Overrides `<output>/pairwise_alignments`.
    #[serde(default)]
    pub pairwise_dir: Option<Utf8PathBuf>,

    /// Overrides `<output>/pairwise_pdbs` (strict mode only).
    #[serde(default)]
    pub coordinate_dir: Option<Utf8PathBuf>,
}

impl Default for AlignerSettings {
    fn default() -> Self {
        Self {
            mustang_path: None,
            alignment_format: default_alignment_format(),
            cpu_percentage: default_cpu_percentage(),
            reconcile_mode: ReconcileMode::default(),
            input_extension: default_input_extension(),
            native_extensions: default_native_extensions(),
            pairwise_dir: None,
            coordinate_dir: None,
        }
    }
}

fn default_alignment_format() -> String {
    "fasta".to_string()
}

fn default_cpu_percentage() -> f64 {
    25.0
}

fn default_input_extension() -> String {
    "pdb".to_string()
}

fn default_native_extensions() -> IndexMap<String, String> {
    let mut extensions = IndexMap::new();
    extensions.insert("fasta".to_string(), "afasta".to_string());
    extensions
}

/// Location of the MUSTANG binary shipped next to the running executable.
pub fn bundled_mustang_path() -> Utf8PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| Utf8PathBuf::try_from(exe).ok())
        .and_then(|exe| exe.parent().map(Utf8Path::to_path_buf))
        .unwrap_or_else(|| Utf8PathBuf::from("."))
        .join("bin")
        .join(BUNDLED_MUSTANG_NAME)
}

impl AlignerSettings {
    /// Executable to invoke, falling back to the bundled binary.
    pub fn resolved_mustang_path(&self) -> Utf8PathBuf {
        self.mustang_path.clone().unwrap_or_else(bundled_mustang_path)
    }

    /// Extension MUSTANG gives the alignment file for the configured format.
    pub fn native_extension(&self) -> &str {
        self.native_extensions
            .get(&self.alignment_format)
            .map(String::as_str)
            .unwrap_or(&self.alignment_format)
    }

    /// Worker count for a machine with `cpus` logical CPUs.
    pub fn concurrency_limit_for(&self, cpus: usize) -> usize {
        let scaled = (cpus as f64 * (self.cpu_percentage / 100.0)).floor() as usize;
        scaled.max(1)
    }

    /// Worker count for this machine.
    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit_for(num_cpus::get())
    }

    pub fn output_layout(&self, output_dir: &Utf8Path) -> OutputLayout {
        match self.reconcile_mode {
            ReconcileMode::Strict => OutputLayout::strict(
                output_dir,
                self.pairwise_dir.as_deref(),
                self.coordinate_dir.as_deref(),
            ),
            ReconcileMode::Lenient => OutputLayout::lenient(output_dir, self.pairwise_dir.as_deref()),
        }
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if !(self.cpu_percentage > 0.0 && self.cpu_percentage <= 100.0) {
            return Err(BatchError::InvalidSettings(format!(
                "cpu_percentage must be in (0, 100], got {}",
                self.cpu_percentage
            )));
        }

        if self.alignment_format.trim().is_empty() {
            return Err(BatchError::InvalidSettings(
                "alignment_format must not be empty".to_string(),
            ));
        }

        if self.input_extension.trim().is_empty() {
            return Err(BatchError::InvalidSettings(
                "input_extension must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
