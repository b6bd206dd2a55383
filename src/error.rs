use camino::Utf8PathBuf;
use thiserror::Error;

/// Configuration-level failures that stop a batch before (or instead of) finishing it.
///
/// Per-pair failures never show up here; they are recorded as
/// [`JobOutcome`](crate::models::JobOutcome) values on the individual results.
/// The one exception is [`BatchError::ToolNotAvailable`], which a worker escalates
/// because every remaining pair would fail the same way.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Input directory {0} does not exist or is not a directory")]
    InputDirNotFound(Utf8PathBuf),

    #[error("Structure file {0} does not exist or is not a file")]
    InvalidPair(Utf8PathBuf),

    #[error("MUSTANG executable not found at {0}")]
    ToolNotAvailable(Utf8PathBuf),

    #[error("Input files {first} and {second} share the identifier '{id}'")]
    DuplicateIdentifier {
        id: String,
        first: Utf8PathBuf,
        second: Utf8PathBuf,
    },

    #[error("Pairs {first} and {second} would both be written as '{id}'")]
    AmbiguousPairIdentifier {
        id: String,
        first: String,
        second: String,
    },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
