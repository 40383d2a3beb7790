//! Detected pattern model

use super::sequence::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Start position of a pattern occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    /// Index of the sub-sequence within its sequence entry
    pub sequence: usize,
    /// Window start offset within that sub-sequence
    pub offset: usize,
}

/// A fixed-width recurring window of symbols
///
/// `uniqueness` is the distinct-symbol count divided by the window width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub symbols: Vec<Symbol>,
    pub occurrences: Vec<Occurrence>,
    pub uniqueness: f64,
    /// Joint transition probability of the symbol chain, when a transition
    /// model gated this pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_probability: Option<f64>,
}

impl Pattern {
    pub fn width(&self) -> usize {
        self.symbols.len()
    }

    pub fn occurrence_count(&self) -> usize {
        self.occurrences.len()
    }
}

/// Distinct-symbol ratio of a window
pub fn uniqueness_of<T: AsRef<str>>(window: &[T]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&str> = window.iter().map(|s| s.as_ref()).collect();
    distinct.len() as f64 / window.len() as f64
}
