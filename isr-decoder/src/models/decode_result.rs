//! Decode output model
//!
//! Output JSON shape, keyed by sequence id:
//! `{ "<id>": { "patterns_detected": [...], "decoded_sequences": [[{...}, ...], ...] } }`

use super::pattern::Pattern;
use super::sequence::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Round to three decimal places (half away from zero)
pub fn round_score(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Scores for one symbol of a decoded sub-sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedSymbol {
    pub symbol: Symbol,
    pub semantic_strength: f64,
    pub harmonic_resonance: f64,
    /// Always `round_score((semantic_strength + harmonic_resonance) / 2)`
    pub combined_score: f64,
    /// Dictionary entry for the symbol, when a dictionary stage is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meaning: Option<serde_json::Value>,
}

impl DecodedSymbol {
    /// Build a decoded symbol, deriving the combined score
    pub fn new(symbol: impl Into<Symbol>, semantic_strength: f64, harmonic_resonance: f64) -> Self {
        Self {
            symbol: symbol.into(),
            semantic_strength,
            harmonic_resonance,
            combined_score: round_score((semantic_strength + harmonic_resonance) / 2.0),
            meaning: None,
        }
    }

    pub fn with_meaning(mut self, meaning: Option<serde_json::Value>) -> Self {
        self.meaning = meaning;
        self
    }
}

/// Result for one sequence id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodeResult {
    pub patterns_detected: Vec<Pattern>,
    /// One inner list per input sub-sequence
    pub decoded_sequences: Vec<Vec<DecodedSymbol>>,
}

/// Full result collection keyed by sequence id
pub type DecodeResults = BTreeMap<String, DecodeResult>;

/// Per-run accounting of sequence units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeReport {
    pub run_id: Uuid,
    /// Ids decoded successfully
    pub processed: usize,
    /// Ids skipped because a symbol could not be scored
    pub skipped: Vec<String>,
    /// Ids whose input was unusable
    pub failed: Vec<String>,
    /// Ids never started because the run was cancelled
    pub cancelled: usize,
}

impl DecodeReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            processed: 0,
            skipped: Vec::new(),
            failed: Vec::new(),
            cancelled: 0,
        }
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled > 0
    }

    /// One-line summary for logs and CLI output
    pub fn summary(&self) -> String {
        format!(
            "processed: {}, skipped: {}, failed: {}, cancelled: {}",
            self.processed,
            self.skipped.len(),
            self.failed.len(),
            self.cancelled
        )
    }
}
