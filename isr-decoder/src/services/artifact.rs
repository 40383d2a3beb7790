//! Bincode artifact decoding shared by the trained model stages

use crate::error::ModelLoadError;
use bincode::Options;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Read and decode a bincode artifact
///
/// The file is read into memory first and decoding is limited to its size,
/// so a corrupt length prefix fails with `Decode` instead of triggering an
/// allocation sized by the prefix.
pub fn load_bincode<T: DeserializeOwned>(path: &Path) -> Result<T, ModelLoadError> {
    let bytes = fs::read(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(bytes.len() as u64)
        .deserialize(&bytes)
        .map_err(|e| ModelLoadError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
