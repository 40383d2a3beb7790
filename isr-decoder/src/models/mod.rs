//! Data models for the decoding engine

pub mod decode_result;
pub mod pattern;
pub mod sequence;

pub use decode_result::{round_score, DecodeReport, DecodeResult, DecodeResults, DecodedSymbol};
pub use pattern::{Occurrence, Pattern};
pub use sequence::{Sequence, SequenceCollection, SequenceEntry, Symbol};
