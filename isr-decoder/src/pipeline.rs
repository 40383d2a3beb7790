//! End-to-end decode run
//!
//! 1. Load sequences (fatal on failure)
//! 2. Build the immutable decode context (fatal on bad parameters, optional
//!    stages disabled on artifact failure)
//! 3. Decode on the worker pool, off the async runtime
//! 4. Write results atomically, unless the run was cancelled

use crate::models::{DecodeReport, SequenceCollection};
use crate::services::output_writer::write_results;
use crate::services::{DecodeContext, DecodeOrchestrator};
use isr_common::config::ModelConfig;
use isr_common::{Error, Result, SharedLogSink};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run a complete decode
///
/// A cancelled run writes nothing, so the previous result file (if any)
/// stays in place.
pub async fn run_decode(
    config: &ModelConfig,
    sequences_path: &Path,
    log: SharedLogSink,
    cancel: CancellationToken,
) -> Result<DecodeReport> {
    log.info("=== Decoding process initiated ===");

    let collection = SequenceCollection::load(sequences_path)?;
    log.info(&format!(
        "Loaded {} sequence id(s) from {}",
        collection.len(),
        sequences_path.display()
    ));

    let context = Arc::new(DecodeContext::from_config(config, log.as_ref())?);
    let output_file = context.output_file().clone();
    let orchestrator = DecodeOrchestrator::new(context, Arc::clone(&log));

    let worker_cancel = cancel.clone();
    let run = tokio::task::spawn_blocking(move || {
        orchestrator.decode_all(&collection, &worker_cancel)
    })
    .await
    .map_err(|e| Error::Internal(format!("Decode task panicked: {}", e)))??;

    if run.report.was_cancelled() || cancel.is_cancelled() {
        log.warn("Decoding cancelled; previous results left unchanged");
        return Ok(run.report);
    }

    write_results(&output_file, &run.results, log.as_ref())?;
    log.info("=== Decoding process completed successfully ===");
    Ok(run.report)
}
