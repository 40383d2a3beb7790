//! # ISR Common Library
//!
//! Shared code for the Indus Script Reconstruction decoding tools:
//! - Error taxonomy (configuration, data, model load, scoring)
//! - Model configuration loading and validation
//! - Injected log sinks
//! - Atomic file persistence

pub mod config;
pub mod error;
pub mod logging;
pub mod persist;

pub use error::{Error, Result};
pub use logging::{LogSink, SharedLogSink};
