//! Pattern Detector
//!
//! Finds recurring, sufficiently unique fixed-width windows within each
//! sub-sequence of a sequence entry.
//!
//! A window qualifies when it also starts at `min_repeats` or more *other*
//! positions of the same sub-sequence (overlapping starts included) and its
//! distinct-symbol ratio is at least the uniqueness threshold. When a
//! transition gate is present the window's joint transition probability
//! must also clear the gate's floor.
//!
//! Windows are grouped with a rolling polynomial hash over interned symbol
//! ids; hash buckets are verified by slice comparison, so collisions never
//! merge distinct windows. Each sub-sequence is scanned once.
//!
//! Output is deduplicated across sub-sequences and ordered by first
//! qualifying occurrence.

use super::transition_model::TransitionGate;
use crate::models::pattern::uniqueness_of;
use crate::models::{Occurrence, Pattern, Symbol};
use isr_common::config::PatternParameters;
use std::collections::HashMap;
use thiserror::Error;

/// Rolling hash base (odd, large, fixed for reproducibility)
const HASH_BASE: u64 = 0x0100_0000_01b3;

/// Pattern detector errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectError {
    /// Parameter out of range, raised before any sequence is scanned
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<DetectError> for isr_common::Error {
    fn from(err: DetectError) -> Self {
        isr_common::Error::InvalidInput(err.to_string())
    }
}

/// Validated detection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternParams {
    window_size: usize,
    min_repeats: usize,
    uniqueness_threshold: f64,
}

impl PatternParams {
    /// Validate raw parameters
    ///
    /// # Errors
    /// `DetectError::InvalidParameter` when `window_size <= 0`,
    /// `min_repeats < 0`, or the threshold is not a finite value in [0, 1].
    pub fn new(
        window_size: i64,
        min_repeats: i64,
        similarity_threshold: f64,
    ) -> Result<Self, DetectError> {
        if window_size <= 0 {
            return Err(DetectError::InvalidParameter(format!(
                "window_size must be positive, got {}",
                window_size
            )));
        }
        if min_repeats < 0 {
            return Err(DetectError::InvalidParameter(format!(
                "min_repeats must not be negative, got {}",
                min_repeats
            )));
        }
        if !similarity_threshold.is_finite() || !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(DetectError::InvalidParameter(format!(
                "similarity_threshold must lie in [0, 1], got {}",
                similarity_threshold
            )));
        }
        Ok(Self {
            window_size: window_size as usize,
            min_repeats: min_repeats as usize,
            uniqueness_threshold: similarity_threshold,
        })
    }

    pub fn from_config(params: &PatternParameters) -> Result<Self, DetectError> {
        Self::new(
            params.window_size,
            params.min_pattern_repeats,
            params.similarity_threshold,
        )
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn min_repeats(&self) -> usize {
        self.min_repeats
    }

    pub fn uniqueness_threshold(&self) -> f64 {
        self.uniqueness_threshold
    }
}

/// Positions sharing one window content
struct WindowGroup {
    first: usize,
    positions: Vec<usize>,
}

/// Pattern detector over the sub-sequences of one sequence entry
pub struct PatternDetector<'a> {
    params: PatternParams,
    gate: Option<&'a TransitionGate>,
}

impl<'a> PatternDetector<'a> {
    pub fn new(params: PatternParams) -> Self {
        Self { params, gate: None }
    }

    /// Additionally require windows to pass the transition gate
    pub fn with_transition_gate(mut self, gate: Option<&'a TransitionGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Detect patterns across `sequences`
    pub fn detect<S: AsRef<[Symbol]>>(&self, sequences: &[S]) -> Vec<Pattern> {
        let mut patterns: Vec<Pattern> = Vec::new();
        let mut index_by_window: HashMap<Vec<Symbol>, usize> = HashMap::new();

        for (sequence_index, sequence) in sequences.iter().enumerate() {
            let sequence = sequence.as_ref();
            for group in self.qualifying_groups(sequence) {
                let window = &sequence[group.first..group.first + self.params.window_size];
                let occurrences = group.positions.iter().map(|&offset| Occurrence {
                    sequence: sequence_index,
                    offset,
                });

                match index_by_window.get(window) {
                    Some(&idx) => patterns[idx].occurrences.extend(occurrences),
                    None => {
                        let transition_probability = match self.gate {
                            Some(gate) => match gate.admit(window) {
                                Some(p) => Some(p),
                                None => continue,
                            },
                            None => None,
                        };
                        index_by_window.insert(window.to_vec(), patterns.len());
                        patterns.push(Pattern {
                            symbols: window.to_vec(),
                            occurrences: occurrences.collect(),
                            uniqueness: uniqueness_of(window),
                            transition_probability,
                        });
                    }
                }
            }
        }
        patterns
    }

    /// Window groups of one sub-sequence passing the repeat and uniqueness
    /// tests, in first-occurrence order
    fn qualifying_groups(&self, sequence: &[Symbol]) -> Vec<WindowGroup> {
        let width = self.params.window_size;
        if sequence.len() < width {
            return Vec::new();
        }

        let ids = intern(sequence);
        let mut groups: Vec<WindowGroup> = Vec::new();
        let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();

        // HASH_BASE^(width - 1), used to drop the outgoing symbol
        let lead_power = (1..width).fold(1u64, |acc, _| acc.wrapping_mul(HASH_BASE));
        let mut hash = ids[..width]
            .iter()
            .fold(0u64, |acc, &id| acc.wrapping_mul(HASH_BASE).wrapping_add(id));

        for start in 0..=sequence.len() - width {
            if start > 0 {
                hash = hash
                    .wrapping_sub(ids[start - 1].wrapping_mul(lead_power))
                    .wrapping_mul(HASH_BASE)
                    .wrapping_add(ids[start + width - 1]);
            }

            let window = &ids[start..start + width];
            let bucket = buckets.entry(hash).or_default();
            let existing = bucket
                .iter()
                .copied()
                .find(|&g| &ids[groups[g].first..groups[g].first + width] == window);

            match existing {
                Some(g) => groups[g].positions.push(start),
                None => {
                    bucket.push(groups.len());
                    groups.push(WindowGroup {
                        first: start,
                        positions: vec![start],
                    });
                }
            }
        }

        groups
            .into_iter()
            .filter(|g| g.positions.len() - 1 >= self.params.min_repeats)
            .filter(|g| {
                uniqueness_of(&sequence[g.first..g.first + width])
                    >= self.params.uniqueness_threshold
            })
            .collect()
    }
}

/// Map each symbol to a small id, starting at 1 so no symbol hashes as zero
fn intern(sequence: &[Symbol]) -> Vec<u64> {
    let mut table: HashMap<&str, u64> = HashMap::new();
    sequence
        .iter()
        .map(|symbol| {
            let next = table.len() as u64 + 1;
            *table.entry(symbol.as_str()).or_insert(next)
        })
        .collect()
}

/// Validate parameters and detect patterns without a transition gate
///
/// # Errors
/// `DetectError::InvalidParameter` before any sequence is scanned.
pub fn detect_patterns<S: AsRef<[Symbol]>>(
    sequences: &[S],
    window_size: i64,
    min_repeats: i64,
    similarity_threshold: f64,
) -> Result<Vec<Pattern>, DetectError> {
    let params = PatternParams::new(window_size, min_repeats, similarity_threshold)?;
    Ok(PatternDetector::new(params).detect(sequences))
}
