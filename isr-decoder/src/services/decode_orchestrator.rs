//! Decode Orchestrator
//!
//! Per sequence id: detect patterns once over all of its sub-sequences,
//! score every symbol, and assemble a [`DecodeResult`].
//!
//! Sequence ids share no mutable state, so they are decoded on a rayon pool.
//! Results are gathered into an ordered map, which makes the output
//! independent of worker scheduling. Cancellation is checked before each id
//! starts; an id that has started always runs to completion.

use super::decode_context::DecodeContext;
use super::pattern_detector::PatternDetector;
use super::semantic_scorer::{ScoringError, SemanticScorer};
use crate::models::{
    DecodeReport, DecodeResult, DecodeResults, DecodedSymbol, SequenceCollection, SequenceEntry,
    Symbol,
};
use isr_common::{Error, Result, SharedLogSink};
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Why a sequence unit produced no result
#[derive(Debug, Error)]
pub enum UnitError {
    /// A symbol could not be scored; the unit is skipped
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// The unit's input is unusable; the unit failed
    #[error("invalid input: {0}")]
    InvalidData(String),
}

/// Outcome of one sequence unit
#[derive(Debug)]
enum UnitOutcome {
    Decoded(DecodeResult),
    Skipped,
    Failed,
    Cancelled,
}

/// Results and accounting of a run
#[derive(Debug, Clone)]
pub struct DecodeRun {
    pub results: DecodeResults,
    pub report: DecodeReport,
}

/// Runs pattern detection and scoring over a sequence collection
pub struct DecodeOrchestrator {
    context: Arc<DecodeContext>,
    log: SharedLogSink,
}

impl DecodeOrchestrator {
    pub fn new(context: Arc<DecodeContext>, log: SharedLogSink) -> Self {
        Self { context, log }
    }

    pub fn context(&self) -> &DecodeContext {
        &self.context
    }

    /// Decode one sequence entry
    pub fn decode_entry(
        &self,
        entry: &SequenceEntry,
    ) -> std::result::Result<DecodeResult, UnitError> {
        if let Some((seq, pos)) = find_blank_token(&entry.symbol_sequences) {
            return Err(UnitError::InvalidData(format!(
                "blank symbol at sequence {} position {}",
                seq, pos
            )));
        }

        let patterns = PatternDetector::new(*self.context.pattern_params())
            .with_transition_gate(self.context.transition_gate())
            .detect(entry.symbol_sequences.as_slice());

        let decoded_sequences = entry
            .symbol_sequences
            .iter()
            .map(|sequence| self.decode_sequence(sequence))
            .collect::<std::result::Result<Vec<_>, ScoringError>>()?;

        Ok(DecodeResult {
            patterns_detected: patterns,
            decoded_sequences,
        })
    }

    /// Score every symbol of one sub-sequence
    ///
    /// Resonance depends only on the sub-sequence length and is computed once.
    pub fn decode_sequence(
        &self,
        sequence: &[Symbol],
    ) -> std::result::Result<Vec<DecodedSymbol>, ScoringError> {
        let resonance = self.context.resonance().resonance_for_length(sequence.len());
        let scorer = SemanticScorer::new(self.context.weights(), self.context.enrichers());
        let enrichers = self.context.enrichers();

        sequence
            .iter()
            .map(|symbol| {
                let strength = scorer.score(symbol)?;
                let meaning = enrichers.iter().find_map(|e| e.annotate(symbol));
                Ok(DecodedSymbol::new(symbol.as_str(), strength, resonance).with_meaning(meaning))
            })
            .collect()
    }

    fn decode_unit(
        &self,
        run_id: Uuid,
        id: &str,
        entry: &SequenceEntry,
        cancel: &CancellationToken,
    ) -> UnitOutcome {
        if cancel.is_cancelled() {
            return UnitOutcome::Cancelled;
        }
        match self.decode_entry(entry) {
            Ok(result) => {
                self.log.info(&format!(
                    "[{}] Decoded sequence '{}' with {} pattern(s).",
                    run_id,
                    id,
                    result.patterns_detected.len()
                ));
                UnitOutcome::Decoded(result)
            }
            Err(UnitError::Scoring(e)) => {
                self.log.warn(&format!("[{}] Skipping sequence '{}': {}", run_id, id, e));
                UnitOutcome::Skipped
            }
            Err(UnitError::InvalidData(msg)) => {
                self.log.error(&format!("[{}] Sequence '{}' failed: {}", run_id, id, msg));
                UnitOutcome::Failed
            }
        }
    }

    /// Decode every id on a worker pool
    ///
    /// Pool size comes from the context; rayon's default otherwise.
    pub fn decode_all(
        &self,
        collection: &SequenceCollection,
        cancel: &CancellationToken,
    ) -> Result<DecodeRun> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = self.context.workers() {
            builder = builder.num_threads(workers);
        }
        let pool = builder
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build decode worker pool: {}", e)))?;

        let run_id = Uuid::new_v4();
        self.log.info(&format!(
            "[{}] Decoding {} sequence id(s) on {} worker(s)",
            run_id,
            collection.len(),
            pool.current_num_threads()
        ));

        let entries: Vec<(&String, &SequenceEntry)> = collection.iter().collect();
        let outcomes: Vec<(String, UnitOutcome)> = pool.install(|| {
            entries
                .par_iter()
                .map(|(id, entry)| ((*id).clone(), self.decode_unit(run_id, id, entry, cancel)))
                .collect()
        });

        Ok(self.assemble(run_id, outcomes))
    }

    /// Decode every id on the calling thread
    pub fn decode_all_sequential(
        &self,
        collection: &SequenceCollection,
        cancel: &CancellationToken,
    ) -> DecodeRun {
        let run_id = Uuid::new_v4();
        let outcomes = collection
            .iter()
            .map(|(id, entry)| (id.clone(), self.decode_unit(run_id, id, entry, cancel)))
            .collect();
        self.assemble(run_id, outcomes)
    }

    fn assemble(&self, run_id: Uuid, outcomes: Vec<(String, UnitOutcome)>) -> DecodeRun {
        let mut results = DecodeResults::new();
        let mut report = DecodeReport::new(run_id);

        for (id, outcome) in outcomes {
            match outcome {
                UnitOutcome::Decoded(result) => {
                    report.processed += 1;
                    results.insert(id, result);
                }
                UnitOutcome::Skipped => report.skipped.push(id),
                UnitOutcome::Failed => report.failed.push(id),
                UnitOutcome::Cancelled => report.cancelled += 1,
            }
        }

        if report.was_cancelled() {
            self.log.warn(&format!(
                "[{}] Run cancelled before {} sequence id(s) started",
                run_id, report.cancelled
            ));
        }
        self.log.info(&format!("[{}] Decode finished ({})", run_id, report.summary()));
        DecodeRun { results, report }
    }
}

/// First empty or whitespace-only token, as (sub-sequence, position)
fn find_blank_token(sequences: &[Vec<Symbol>]) -> Option<(usize, usize)> {
    sequences.iter().enumerate().find_map(|(s, sequence)| {
        sequence
            .iter()
            .position(|symbol| symbol.trim().is_empty())
            .map(|p| (s, p))
    })
}
