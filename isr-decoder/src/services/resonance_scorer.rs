//! Resonance Scorer
//!
//! `|mean(sin(h * n) for h in bands) * fractal_depth_weight * symmetry_coupling_factor|`
//! where `n` is the group length.
//!
//! The score depends only on the group length and the configuration, never
//! on which symbols the group holds. Changing that would change every
//! published score and needs its own versioned scoring model.

use isr_common::config::ResonanceParameters;
use isr_common::{Error, Result};

/// Validated resonance parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ResonanceConfig {
    harmonic_bands: Vec<u64>,
    fractal_depth_weight: f64,
    symmetry_coupling_factor: f64,
}

impl ResonanceConfig {
    pub fn new(
        harmonic_bands: Vec<u64>,
        fractal_depth_weight: f64,
        symmetry_coupling_factor: f64,
    ) -> Result<Self> {
        if harmonic_bands.is_empty() || harmonic_bands.contains(&0) {
            return Err(Error::Config(
                "harmonic_bands must be a non-empty list of positive integers".to_string(),
            ));
        }
        if !fractal_depth_weight.is_finite() || !symmetry_coupling_factor.is_finite() {
            return Err(Error::Config("resonance factors must be finite".to_string()));
        }
        Ok(Self {
            harmonic_bands,
            fractal_depth_weight,
            symmetry_coupling_factor,
        })
    }

    pub fn from_config(params: &ResonanceParameters) -> Result<Self> {
        let bands = params
            .harmonic_bands
            .iter()
            .map(|&b| {
                u64::try_from(b)
                    .map_err(|_| Error::Config(format!("harmonic band {} is negative", b)))
            })
            .collect::<Result<Vec<u64>>>()?;
        Self::new(
            bands,
            params.fractal_depth_weight,
            params.symmetry_coupling_factor,
        )
    }

    pub fn harmonic_bands(&self) -> &[u64] {
        &self.harmonic_bands
    }

    /// Resonance of any group holding `len` symbols
    pub fn resonance_for_length(&self, len: usize) -> f64 {
        if len == 0 {
            return 0.0;
        }
        let n = len as u64;
        let mean = self
            .harmonic_bands
            .iter()
            .map(|&h| (h.saturating_mul(n) as f64).sin())
            .sum::<f64>()
            / self.harmonic_bands.len() as f64;
        (mean * self.fractal_depth_weight * self.symmetry_coupling_factor).abs()
    }
}

impl Default for ResonanceConfig {
    fn default() -> Self {
        Self {
            harmonic_bands: vec![1, 3, 5, 7],
            fractal_depth_weight: 1.25,
            symmetry_coupling_factor: 0.85,
        }
    }
}

/// Resonance of `group` (a function of its length only)
pub fn harmonic_resonance<T>(group: &[T], config: &ResonanceConfig) -> f64 {
    config.resonance_for_length(group.len())
}
