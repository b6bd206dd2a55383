// mustang-align - Batch pairwise structural alignment with MUSTANG
//
// This is the library crate containing the orchestration engine and data structures.
// The binary crate (main.rs) provides the command line entry point.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use error::BatchError;
pub use models::{AlignerSettings, BatchSummary, ReconcileMode};
pub use services::{BatchInput, BatchRunner};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
