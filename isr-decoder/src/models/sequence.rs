//! Sequence input model
//!
//! Input JSON shape: `{ "<id>": { "symbol_sequences": [["TOK", ...], ...] } }`

use isr_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Atomic token representing one transcribed sign
pub type Symbol = String;

/// Ordered symbols from one source object
pub type Sequence = Vec<Symbol>;

/// One keyed entry of the input collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceEntry {
    #[serde(default)]
    pub symbol_sequences: Vec<Sequence>,
}

impl SequenceEntry {
    pub fn new(symbol_sequences: Vec<Sequence>) -> Self {
        Self { symbol_sequences }
    }
}

/// Immutable mapping from sequence id to its sub-sequences
///
/// Ids iterate in sorted order so every consumer sees the same ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceCollection {
    entries: BTreeMap<String, SequenceEntry>,
}

impl SequenceCollection {
    pub fn new(entries: BTreeMap<String, SequenceEntry>) -> Self {
        Self { entries }
    }

    /// Load the collection from a JSON file
    ///
    /// A missing file, malformed JSON or an empty collection is a fatal
    /// [`Error::Data`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Data(format!("Missing required file: {} ({})", path.display(), e))
        })?;
        let collection = Self::from_json_str(&content).map_err(|e| match e {
            Error::Data(msg) => Error::Data(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        Ok(collection)
    }

    /// Parse a collection from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let collection: Self = serde_json::from_str(content)
            .map_err(|e| Error::Data(format!("Invalid JSON format: {}", e)))?;
        if collection.is_empty() {
            return Err(Error::Data("sequence input contains no entries".to_string()));
        }
        Ok(collection)
    }

    pub fn get(&self, id: &str) -> Option<&SequenceEntry> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SequenceEntry)> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// All sub-sequences across every id, in id order
    pub fn all_sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.entries.values().flat_map(|e| e.symbol_sequences.iter())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, SequenceEntry)> for SequenceCollection {
    fn from_iter<I: IntoIterator<Item = (String, SequenceEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
