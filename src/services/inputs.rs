//! Input discovery and pair planning.
//!
//! [`enumerate_inputs`] lists the structure files of an input directory,
//! [`generate_pairs`] expands a sequence into its ordered cross product with
//! repetition, and [`plan_jobs`] turns that cross product into [`PairJob`]s.

use camino::Utf8Path;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use crate::error::BatchError;
use crate::models::{InputStructure, OutputLayout, PairJob};

/// List the files in `input_dir` whose extension is `extension`, in directory-listing order.
///
/// An empty result is not an error; it is logged as a warning and the caller
/// should treat it as "nothing to do".
pub fn enumerate_inputs(
    input_dir: &Utf8Path,
    extension: &str,
) -> Result<Vec<InputStructure>, BatchError> {
    if !input_dir.is_dir() {
        return Err(BatchError::InputDirNotFound(input_dir.to_path_buf()));
    }

    let mut inputs = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let entry = entry?;
        let path = match camino::Utf8PathBuf::try_from(entry.path()) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Skipping non UTF-8 path: {}", e);
                continue;
            }
        };

        if path.extension() != Some(extension) || !path.is_file() {
            continue;
        }

        match InputStructure::from_path(path) {
            Some(input) => inputs.push(input),
            None => tracing::debug!("Skipping file without a usable stem in {}", input_dir),
        }
    }

    if inputs.is_empty() {
        tracing::warn!("No {} files found in {}", extension, input_dir);
    } else {
        tracing::debug!("Found {} {} files in {}", inputs.len(), extension, input_dir);
    }

    Ok(inputs)
}

/// Reject input sets in which two files share an identifier.
///
/// Their pair outputs would overwrite each other.
pub fn ensure_unique_identifiers(inputs: &[InputStructure]) -> Result<(), BatchError> {
    let mut seen: HashMap<&str, &InputStructure> = HashMap::with_capacity(inputs.len());

    for input in inputs {
        if let Some(previous) = seen.insert(input.id(), input) {
            return Err(BatchError::DuplicateIdentifier {
                id: input.id().to_string(),
                first: previous.path().to_path_buf(),
                second: input.path().to_path_buf(),
            });
        }
    }

    Ok(())
}

/// Reject job sets in which two different pairs map to the same output identifier.
///
/// Happens when identifiers contain the pair separator, e.g. `a_b` + `c` and
/// `a` + `b_c` both become `a_b_c`.
pub fn ensure_unique_pair_ids(jobs: &[PairJob]) -> Result<(), BatchError> {
    let mut seen: HashMap<&str, &PairJob> = HashMap::with_capacity(jobs.len());

    for job in jobs {
        if let Some(previous) = seen.insert(job.id(), job) {
            return Err(BatchError::AmbiguousPairIdentifier {
                id: job.id().to_string(),
                first: describe_pair(previous),
                second: describe_pair(job),
            });
        }
    }

    Ok(())
}

fn describe_pair(job: &PairJob) -> String {
    format!("({}, {})", job.first().path(), job.second().path())
}

/// Every ordered pair `(i, j)` over `items`, self pairs included: `N²` entries, row-major.
pub fn generate_pairs<T: Clone>(items: &[T]) -> Vec<(T, T)> {
    let mut pairs = Vec::with_capacity(items.len() * items.len());
    for first in items {
        for second in items {
            pairs.push((first.clone(), second.clone()));
        }
    }
    pairs
}

/// The all-vs-all job set for `inputs`.
pub fn plan_jobs(inputs: &[InputStructure], layout: &Arc<OutputLayout>) -> Vec<PairJob> {
    let shared: Vec<Arc<InputStructure>> = inputs.iter().cloned().map(Arc::new).collect();

    generate_pairs(&shared)
        .into_iter()
        .map(|(first, second)| PairJob::new(first, second, Arc::clone(layout)))
        .collect()
}
