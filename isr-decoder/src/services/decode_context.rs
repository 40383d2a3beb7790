//! Immutable per-run decode context
//!
//! Built once before decoding starts from the model configuration and any
//! trained artifacts, then shared read-only by every worker. A later run
//! with different parameters builds a new context.

use super::enrichment::{DictionaryEnricher, EmbeddingRefiner, SymbolEnricher};
use super::pattern_detector::PatternParams;
use super::resonance_scorer::ResonanceConfig;
use super::semantic_scorer::WeightVector;
use super::transition_model::{TransitionGate, TransitionModel};
use isr_common::config::ModelConfig;
use isr_common::{Error, LogSink, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a decode run reads
#[derive(Clone)]
pub struct DecodeContext {
    pattern_params: PatternParams,
    weights: WeightVector,
    resonance: ResonanceConfig,
    transition_gate: Option<TransitionGate>,
    enrichers: Vec<Arc<dyn SymbolEnricher>>,
    output_file: PathBuf,
    workers: Option<usize>,
}

impl DecodeContext {
    /// Context with base scoring only
    pub fn new(
        pattern_params: PatternParams,
        weights: WeightVector,
        resonance: ResonanceConfig,
    ) -> Self {
        Self {
            pattern_params,
            weights,
            resonance,
            transition_gate: None,
            enrichers: Vec::new(),
            output_file: PathBuf::from("./output/decoded_sequences.json"),
            workers: None,
        }
    }

    /// Build the context for a run
    ///
    /// Parameter problems are fatal [`Error::Config`]. Artifacts that fail to
    /// load are reported through `log` and their stage is disabled.
    pub fn from_config(config: &ModelConfig, log: &dyn LogSink) -> Result<Self> {
        config.validate()?;
        let algorithm = &config.algorithm;

        let pattern_params = PatternParams::from_config(&algorithm.pattern_recognition.parameters)
            .map_err(|e| Error::Config(e.to_string()))?;
        let weights = WeightVector::from_config(&algorithm.semantic_mapping.parameters);
        let missing = weights.missing_categories();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|c| c.as_str()).collect();
            log.warn(&format!(
                "field_bias_weights lacks {}; affected symbols will be skipped",
                names.join(", ")
            ));
        }
        let resonance = ResonanceConfig::from_config(&algorithm.resonance_model.parameters)?;

        let mut context = Self::new(pattern_params, weights, resonance)
            .with_output_file(config.output.decoded_sequences_file.clone())
            .with_workers(config.runtime.workers);

        if let Some(markov) = &algorithm.markov_model {
            match TransitionModel::load(&markov.model_file) {
                Ok(model) => {
                    log.info(&format!(
                        "Transition model loaded: {} source symbols",
                        model.symbol_count()
                    ));
                    context = context.with_transition_gate(TransitionGate::new(
                        model,
                        markov.probability_floor,
                        markov.default_probability,
                    ));
                }
                Err(e) => log.warn(&format!(
                    "Transition filtering disabled for this run: {}",
                    e
                )),
            }
        }

        if let Some(embedding) = &algorithm.embedding_model {
            match EmbeddingRefiner::load(&embedding.model_file) {
                Ok(refiner) => {
                    log.info("Embedding refinement enabled");
                    context = context.with_enricher(Arc::new(refiner));
                }
                Err(e) => log.warn(&format!(
                    "Embedding refinement disabled for this run: {}",
                    e
                )),
            }
        }

        if let Some(dictionary) = &algorithm.dictionary {
            match DictionaryEnricher::load(&dictionary.file) {
                Ok(enricher) => {
                    log.info(&format!("Dictionary loaded: {} entries", enricher.len()));
                    context = context.with_enricher(Arc::new(enricher));
                }
                Err(e) => log.warn(&format!(
                    "Dictionary enrichment disabled for this run: {}",
                    e
                )),
            }
        }

        Ok(context)
    }

    pub fn with_transition_gate(mut self, gate: TransitionGate) -> Self {
        self.transition_gate = Some(gate);
        self
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn SymbolEnricher>) -> Self {
        self.enrichers.push(enricher);
        self
    }

    pub fn with_output_file(mut self, path: PathBuf) -> Self {
        self.output_file = path;
        self
    }

    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn pattern_params(&self) -> &PatternParams {
        &self.pattern_params
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn resonance(&self) -> &ResonanceConfig {
        &self.resonance
    }

    pub fn transition_gate(&self) -> Option<&TransitionGate> {
        self.transition_gate.as_ref()
    }

    pub fn enrichers(&self) -> &[Arc<dyn SymbolEnricher>] {
        &self.enrichers
    }

    /// Names of the enabled optional stages
    pub fn enabled_stages(&self) -> Vec<&'static str> {
        let mut stages = Vec::new();
        if self.transition_gate.is_some() {
            stages.push("transition");
        }
        stages.extend(self.enrichers.iter().map(|e| e.name()));
        stages
    }

    pub fn output_file(&self) -> &PathBuf {
        &self.output_file
    }

    pub fn workers(&self) -> Option<usize> {
        self.workers
    }
}
