//! Output Assembler
//!
//! Persists the decode result collection as JSON keyed by sequence id. The
//! file is replaced atomically: readers see either the previous complete
//! result or the new complete result.

use crate::models::DecodeResults;
use isr_common::persist::write_json_atomic;
use isr_common::{Error, LogSink, Result};
use std::path::Path;

/// Write `results` to `path`, replacing any previous result file
pub fn write_results(path: &Path, results: &DecodeResults, log: &dyn LogSink) -> Result<()> {
    write_json_atomic(path, results)?;
    log.info(&format!(
        "Results written to {} ({} sequence id(s))",
        path.display(),
        results.len()
    ));
    Ok(())
}

/// Read a result file written by [`write_results`]
pub fn load_results(path: &Path) -> Result<DecodeResults> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))
}
