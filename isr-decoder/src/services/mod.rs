//! Decoding engine services
//!
//! Dependency order: pattern detection (optionally gated by the transition
//! model), semantic and resonance scoring, enrichment stages, then the
//! orchestrator and output assembler.

pub mod artifact;
pub mod converter;
pub mod decode_context;
pub mod decode_orchestrator;
pub mod enrichment;
pub mod output_writer;
pub mod pattern_detector;
pub mod resonance_scorer;
pub mod semantic_scorer;
pub mod transition_model;

pub use decode_context::DecodeContext;
pub use decode_orchestrator::{DecodeOrchestrator, DecodeRun};
pub use enrichment::{DictionaryEnricher, EmbeddingRefiner, SymbolEnricher};
pub use pattern_detector::{detect_patterns, DetectError, PatternDetector, PatternParams};
pub use resonance_scorer::{harmonic_resonance, ResonanceConfig};
pub use semantic_scorer::{
    semantic_strength, ScoringError, SemanticCategory, SemanticScorer, WeightVector,
};
pub use transition_model::{TransitionGate, TransitionModel};
