//! isr-decoder library interface
//!
//! Decoding engine for tokenized inscription sequences: recurring pattern
//! detection, semantic and resonance scoring, optional transition-model
//! filtering and enrichment stages, and atomic result output.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;

pub use crate::error::ModelLoadError;
pub use crate::models::{
    DecodeReport, DecodeResult, DecodeResults, DecodedSymbol, Pattern, SequenceCollection,
};
pub use crate::pipeline::run_decode;
pub use crate::services::{DecodeContext, DecodeOrchestrator};
