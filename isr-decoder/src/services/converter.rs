//! Raw input conversion
//!
//! Normalizes raw transcriptions into the sequence input format before the
//! decoder ever sees them. Text input holds one inscription per line with
//! whitespace-separated tokens.

use crate::models::{SequenceCollection, SequenceEntry, Symbol};
use isr_common::{Error, Result};
use std::path::Path;

/// Trim, uppercase and replace inner spaces with underscores
pub fn normalize_symbol(raw: &str) -> Symbol {
    raw.trim().to_uppercase().replace(' ', "_")
}

/// Convert line-oriented text into a sequence collection
///
/// Line `n` (1-based) becomes id `SEQ_<n>` holding a single sub-sequence.
/// Blank lines are skipped without renumbering the following lines.
pub fn from_text(content: &str) -> SequenceCollection {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let tokens: Vec<Symbol> = line.split_whitespace().map(normalize_symbol).collect();
            if tokens.is_empty() {
                None
            } else {
                Some((format!("SEQ_{}", i + 1), SequenceEntry::new(vec![tokens])))
            }
        })
        .collect()
}

/// Read and convert a text file
///
/// # Errors
/// `Error::Data` if the file cannot be read or holds no tokens.
pub fn from_text_file(path: &Path) -> Result<SequenceCollection> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Data(format!("Cannot read {}: {}", path.display(), e)))?;
    let collection = from_text(&content);
    if collection.is_empty() {
        return Err(Error::Data(format!("No sequences found in {}", path.display())));
    }
    Ok(collection)
}
