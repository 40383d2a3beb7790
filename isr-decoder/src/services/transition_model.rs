//! Transition Model
//!
//! Empirical first-order next-symbol probabilities trained from a sequence
//! corpus. Training is a separate batch step (`train-markov` binary); a
//! decode run only loads the resulting artifact and reads it.
//!
//! The artifact is a bincode encoding of the probability table, written
//! atomically.

use super::artifact::load_bincode;
use crate::error::ModelLoadError;
use crate::models::{SequenceCollection, Symbol};
use isr_common::persist::write_atomic;
use isr_common::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Tolerance on per-source probability sums when validating an artifact
const SUM_TOLERANCE: f64 = 1e-6;

/// Read-only next-symbol probability table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionModel {
    transitions: BTreeMap<Symbol, BTreeMap<Symbol, f64>>,
}

impl TransitionModel {
    /// Count successor transitions across every sub-sequence of every id
    /// and normalize per source symbol
    pub fn train(collection: &SequenceCollection) -> Self {
        Self::train_sequences(collection.all_sequences().map(|s| s.as_slice()))
    }

    /// Train from an arbitrary corpus of sequences
    pub fn train_sequences<'a, I>(sequences: I) -> Self
    where
        I: IntoIterator<Item = &'a [Symbol]>,
    {
        let mut counts: BTreeMap<&'a str, BTreeMap<&'a str, u64>> = BTreeMap::new();
        for sequence in sequences {
            for pair in sequence.windows(2) {
                *counts
                    .entry(pair[0].as_str())
                    .or_default()
                    .entry(pair[1].as_str())
                    .or_default() += 1;
            }
        }

        let transitions = counts
            .into_iter()
            .map(|(from, successors)| {
                let total: u64 = successors.values().sum();
                let distribution = successors
                    .into_iter()
                    .map(|(to, count)| (to.to_string(), count as f64 / total as f64))
                    .collect();
                (from.to_string(), distribution)
            })
            .collect();

        Self { transitions }
    }

    /// Probability of `to` immediately following `from`, if observed
    pub fn probability(&self, from: &str, to: &str) -> Option<f64> {
        self.transitions.get(from).and_then(|next| next.get(to)).copied()
    }

    /// Observed successor distribution of `from`
    pub fn successors(&self, from: &str) -> Option<&BTreeMap<Symbol, f64>> {
        self.transitions.get(from)
    }

    /// Product of consecutive pairwise probabilities along `chain`
    ///
    /// Unseen pairs contribute `fallback`. Chains shorter than two symbols
    /// have probability 1.0.
    pub fn joint_probability<T: AsRef<str>>(&self, chain: &[T], fallback: f64) -> f64 {
        chain
            .windows(2)
            .map(|pair| {
                self.probability(pair[0].as_ref(), pair[1].as_ref())
                    .unwrap_or(fallback)
            })
            .product()
    }

    /// Number of source symbols with at least one observed successor
    pub fn symbol_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Write the model artifact atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, |writer| {
            bincode::serialize_into(&mut *writer, self)
                .map_err(|e| isr_common::Error::Serialization(e.to_string()))
        })
    }

    /// Load and validate a model artifact
    pub fn load(path: &Path) -> std::result::Result<Self, ModelLoadError> {
        let model: Self = load_bincode(path)?;
        model.validate().map_err(|reason| ModelLoadError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(model)
    }

    /// Every distribution has values in [0, 1] summing to 1
    fn validate(&self) -> std::result::Result<(), String> {
        for (from, successors) in &self.transitions {
            if successors.is_empty() {
                return Err(format!("symbol '{}' has no successors", from));
            }
            if let Some((to, p)) = successors
                .iter()
                .find(|(_, p)| !p.is_finite() || **p < 0.0 || **p > 1.0)
            {
                return Err(format!("probability {} -> {} out of range: {}", from, to, p));
            }
            let sum: f64 = successors.values().sum();
            if (sum - 1.0).abs() > SUM_TOLERANCE {
                return Err(format!("distribution of '{}' sums to {}", from, sum));
            }
        }
        Ok(())
    }
}

/// Transition model plus the thresholds used to gate candidate patterns
#[derive(Debug, Clone)]
pub struct TransitionGate {
    pub model: TransitionModel,
    /// Minimum joint probability for a window to be kept
    pub probability_floor: f64,
    /// Probability assumed for unseen pairs
    pub default_probability: f64,
}

impl TransitionGate {
    pub fn new(model: TransitionModel, probability_floor: f64, default_probability: f64) -> Self {
        Self {
            model,
            probability_floor,
            default_probability,
        }
    }

    /// Joint probability of `window` when it clears the floor, `None` otherwise
    pub fn admit<T: AsRef<str>>(&self, window: &[T]) -> Option<f64> {
        let joint = self.model.joint_probability(window, self.default_probability);
        if joint >= self.probability_floor {
            Some(joint)
        } else {
            None
        }
    }
}
