//! Common error types for ISR

use thiserror::Error;

/// Common result type for ISR operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the ISR tools
///
/// `Config` and `Data` are fatal and abort a run before any decoding.
/// `ModelLoad` disables the affected refinement stage. `Scoring` is
/// confined to the sequence unit that raised it.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration, or a missing required parameter
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing, empty or malformed sequence input
    #[error("Data error: {0}")]
    Data(String),

    /// Corrupt or incompatible trained model artifact
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Per-symbol score computation failure
    #[error("Scoring error: {0}")]
    Scoring(String),

    /// Invalid caller-supplied parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding of a persisted structure failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (worker pool or task failure)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors that must abort a run before scheduling work
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Data(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
