//! Error types for isr-decoder
//!
//! Service-specific errors live next to their services (`DetectError`,
//! `ScoringError`). Model artifact failures are shared by every optional
//! refinement stage and are defined here.

use std::path::PathBuf;
use thiserror::Error;

/// Trained artifact could not be used
///
/// Never fatal: the stage that needed the artifact is disabled for the run.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    /// Artifact missing or unreadable
    #[error("cannot read model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact bytes do not decode to the expected structure
    #[error("corrupt or incompatible model {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// Artifact decoded but violates a model invariant
    #[error("invalid model {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

impl From<ModelLoadError> for isr_common::Error {
    fn from(err: ModelLoadError) -> Self {
        isr_common::Error::ModelLoad(err.to_string())
    }
}
