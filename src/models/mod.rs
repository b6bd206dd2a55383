//! Data models for mustang-align.
//!
//! - [`InputStructure`]: a structure file and its short identifier
//! - [`PairJob`]: one (first, second) alignment with its output locations
//! - [`JobState`] / [`JobOutcome`] / [`JobResult`]: lifecycle and result of a single job
//! - [`BatchSummary`]: expected vs. succeeded counts for a finished batch
//! - [`OutputLayout`]: the canonical output directories
//! - [`AlignerSettings`]: batch configuration, loaded from YAML by
//!   [`ConfigManager`](crate::config::ConfigManager)

pub mod config;
pub mod job;
pub mod layout;
pub mod summary;

pub use config::{AlignerSettings, ReconcileMode, bundled_mustang_path};
pub use job::{InputStructure, InvalidTransition, JobOutcome, JobResult, JobState, PAIR_SEPARATOR, PairJob};
pub use layout::{ALIGNMENT_DIR_NAME, COORDINATE_DIR_NAME, OutputLayout, WORK_DIR_NAME};
pub use summary::{BatchSummary, FailedPair};
