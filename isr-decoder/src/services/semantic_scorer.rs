//! Semantic Scorer
//!
//! `strength = Σ base_value[c] * weight[c]` over the four fixed categories,
//! then passed through any enabled enrichment stages (embedding blend).
//!
//! A weight vector lacking a category is a [`ScoringError`] for the symbol
//! being scored. There is no fallback weight.

use super::enrichment::SymbolEnricher;
use isr_common::config::SemanticParameters;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Fixed semantic category basis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticCategory {
    Quantum,
    Scalar,
    Consciousness,
    Geometric,
}

impl SemanticCategory {
    pub const ALL: [SemanticCategory; 4] = [
        SemanticCategory::Quantum,
        SemanticCategory::Scalar,
        SemanticCategory::Consciousness,
        SemanticCategory::Geometric,
    ];

    /// Key used in `field_bias_weights`
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticCategory::Quantum => "Quantum",
            SemanticCategory::Scalar => "Scalar",
            SemanticCategory::Consciousness => "Consciousness",
            SemanticCategory::Geometric => "Geometric",
        }
    }

    pub fn base_value(&self) -> f64 {
        match self {
            SemanticCategory::Quantum => 0.7,
            SemanticCategory::Scalar => 0.6,
            SemanticCategory::Consciousness => 0.9,
            SemanticCategory::Geometric => 0.5,
        }
    }
}

impl fmt::Display for SemanticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring errors, confined to the symbol (and its sequence unit)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    /// Weight vector does not supply a required category
    #[error("no weight for category {category} while scoring symbol '{symbol}'")]
    MissingCategory {
        symbol: String,
        category: SemanticCategory,
    },

    /// Computation produced NaN or infinity
    #[error("non-finite {stage} score {value} for symbol '{symbol}'")]
    NonFinite {
        symbol: String,
        stage: &'static str,
        value: f64,
    },
}

impl From<ScoringError> for isr_common::Error {
    fn from(err: ScoringError) -> Self {
        isr_common::Error::Scoring(err.to_string())
    }
}

/// Category weights as configured; may be incomplete
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightVector {
    weights: BTreeMap<String, f64>,
}

impl WeightVector {
    pub fn new(weights: BTreeMap<String, f64>) -> Self {
        Self { weights }
    }

    pub fn from_config(params: &SemanticParameters) -> Self {
        Self::new(params.field_bias_weights.clone())
    }

    /// Weight vector supplying every category
    pub fn complete(quantum: f64, scalar: f64, consciousness: f64, geometric: f64) -> Self {
        let values = [quantum, scalar, consciousness, geometric];
        Self::new(
            SemanticCategory::ALL
                .iter()
                .zip(values)
                .map(|(c, w)| (c.as_str().to_string(), w))
                .collect(),
        )
    }

    pub fn weight(&self, category: SemanticCategory) -> Option<f64> {
        self.weights.get(category.as_str()).copied()
    }

    pub fn missing_categories(&self) -> Vec<SemanticCategory> {
        SemanticCategory::ALL
            .into_iter()
            .filter(|c| self.weight(*c).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_categories().is_empty()
    }
}

/// Raw category-weighted strength of `symbol`
///
/// The value depends on the weight vector only; `symbol` identifies the
/// unit in errors.
pub fn semantic_strength(symbol: &str, weights: &WeightVector) -> Result<f64, ScoringError> {
    SemanticCategory::ALL.iter().try_fold(0.0, |sum, category| {
        let weight = weights
            .weight(*category)
            .ok_or_else(|| ScoringError::MissingCategory {
                symbol: symbol.to_string(),
                category: *category,
            })?;
        Ok(sum + category.base_value() * weight)
    })
}

/// Semantic scoring with optional refinement stages
pub struct SemanticScorer<'a> {
    weights: &'a WeightVector,
    enrichers: &'a [Arc<dyn SymbolEnricher>],
}

impl<'a> SemanticScorer<'a> {
    pub fn new(weights: &'a WeightVector, enrichers: &'a [Arc<dyn SymbolEnricher>]) -> Self {
        Self { weights, enrichers }
    }

    /// Raw strength refined by every enabled stage in order
    pub fn score(&self, symbol: &str) -> Result<f64, ScoringError> {
        let raw = semantic_strength(symbol, self.weights)?;
        let refined = self
            .enrichers
            .iter()
            .fold(raw, |score, enricher| enricher.refine_score(symbol, score));
        if !refined.is_finite() {
            return Err(ScoringError::NonFinite {
                symbol: symbol.to_string(),
                stage: "semantic",
                value: refined,
            });
        }
        Ok(refined)
    }
}
