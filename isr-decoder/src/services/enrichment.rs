//! Optional enrichment stages
//!
//! Stages plug into scoring through [`SymbolEnricher`]. None is required:
//! a stage whose artifact cannot be loaded is simply left out of the run.
//!
//! - [`EmbeddingRefiner`] blends the raw semantic score with the mean
//!   absolute value of a precomputed symbol embedding.
//! - [`DictionaryEnricher`] attaches a dictionary entry to decoded symbols
//!   and never touches scores.

use super::artifact::load_bincode;
use super::converter::normalize_symbol;
use crate::error::ModelLoadError;
use crate::models::Symbol;
use isr_common::persist::write_atomic;
use isr_common::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Capability interface for optional per-symbol stages
pub trait SymbolEnricher: Send + Sync {
    /// Stage name for log messages
    fn name(&self) -> &'static str;

    /// Refine a semantic score; identity unless the stage adjusts scores
    fn refine_score(&self, _symbol: &str, raw: f64) -> f64 {
        raw
    }

    /// Annotation attached to the decoded symbol, if any
    fn annotate(&self, _symbol: &str) -> Option<serde_json::Value> {
        None
    }
}

/// Precomputed symbol embeddings (bincode artifact)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingTable {
    embeddings: BTreeMap<Symbol, Vec<f64>>,
}

impl EmbeddingTable {
    /// Embedding of `symbol`; empty vectors count as absent
    pub fn get(&self, symbol: &str) -> Option<&[f64]> {
        self.embeddings
            .get(symbol)
            .map(|v| v.as_slice())
            .filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Read a `{ "<symbol>": [f64, ...] }` JSON export
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            isr_common::Error::Data(format!("cannot read {}: {}", path.display(), e))
        })?;
        let embeddings: BTreeMap<Symbol, Vec<f64>> =
            serde_json::from_str(&content).map_err(|e| {
                isr_common::Error::Data(format!("malformed embeddings {}: {}", path.display(), e))
            })?;
        Ok(Self { embeddings })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, |writer| {
            bincode::serialize_into(&mut *writer, self)
                .map_err(|e| isr_common::Error::Serialization(e.to_string()))
        })
    }

    pub fn load(path: &Path) -> std::result::Result<Self, ModelLoadError> {
        let table: Self = load_bincode(path)?;
        if let Some((symbol, _)) = table
            .embeddings
            .iter()
            .find(|(_, v)| v.iter().any(|x| !x.is_finite()))
        {
            return Err(ModelLoadError::Invalid {
                path: path.to_path_buf(),
                reason: format!("non-finite embedding component for '{}'", symbol),
            });
        }
        Ok(table)
    }
}

impl FromIterator<(Symbol, Vec<f64>)> for EmbeddingTable {
    fn from_iter<I: IntoIterator<Item = (Symbol, Vec<f64>)>>(iter: I) -> Self {
        Self {
            embeddings: iter.into_iter().collect(),
        }
    }
}

/// `refined = (raw + mean(|embedding|)) / 2` for embedded symbols
pub struct EmbeddingRefiner {
    table: EmbeddingTable,
}

impl EmbeddingRefiner {
    pub fn new(table: EmbeddingTable) -> Self {
        Self { table }
    }

    pub fn load(path: &Path) -> std::result::Result<Self, ModelLoadError> {
        EmbeddingTable::load(path).map(Self::new)
    }
}

impl SymbolEnricher for EmbeddingRefiner {
    fn name(&self) -> &'static str {
        "embedding"
    }

    fn refine_score(&self, symbol: &str, raw: f64) -> f64 {
        match self.table.get(symbol) {
            Some(embedding) => {
                let mean_abs =
                    embedding.iter().map(|x| x.abs()).sum::<f64>() / embedding.len() as f64;
                (raw + mean_abs) / 2.0
            }
            None => raw,
        }
    }
}

/// Symbol dictionary: `{ "<symbol>": <entry> }` JSON
pub struct DictionaryEnricher {
    entries: BTreeMap<String, serde_json::Value>,
}

impl DictionaryEnricher {
    pub fn new(entries: BTreeMap<String, serde_json::Value>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> std::result::Result<Self, ModelLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries = serde_json::from_str(&content).map_err(|e| ModelLoadError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SymbolEnricher for DictionaryEnricher {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    /// Exact key first, then the normalized token form
    fn annotate(&self, symbol: &str) -> Option<serde_json::Value> {
        self.entries
            .get(symbol)
            .or_else(|| self.entries.get(&normalize_symbol(symbol)))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedding_blend() {
        let refiner = EmbeddingRefiner::new(EmbeddingTable::from_iter([
            ("FISH".to_string(), vec![-0.2, 0.4]),
            ("VOID".to_string(), vec![]),
        ]));

        assert!((refiner.refine_score("FISH", 1.0) - 0.65).abs() < 1e-12);
        assert_eq!(refiner.refine_score("VOID", 1.0), 1.0);
        assert_eq!(refiner.refine_score("JAR", 1.0), 1.0);
        assert!(refiner.annotate("FISH").is_none());
    }

    #[test]
    fn test_embedding_table_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semantic_model.bin");
        let table = EmbeddingTable::from_iter([("KNOT_LOOP".to_string(), vec![0.1, 0.2, 0.3])]);

        table.save(&path).unwrap();
        assert_eq!(EmbeddingTable::load(&path).unwrap(), table);

        std::fs::write(&path, b"garbage").unwrap();
        assert!(EmbeddingTable::load(&path).is_err());
    }

    #[test]
    fn test_json_export_converts_to_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("embeddings.json");
        let bin_path = dir.path().join("semantic_model.bin");
        std::fs::write(&json_path, r#"{"FISH": [0.5, -0.5], "JAR": []}"#).unwrap();

        let table = EmbeddingTable::from_json_file(&json_path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("FISH"), Some(&[0.5, -0.5][..]));
        assert_eq!(table.get("JAR"), None);

        table.save(&bin_path).unwrap();
        assert_eq!(EmbeddingTable::load(&bin_path).unwrap(), table);

        std::fs::write(&json_path, r#"{"FISH": "not a vector"}"#).unwrap();
        assert!(matches!(
            EmbeddingTable::from_json_file(&json_path),
            Err(isr_common::Error::Data(_))
        ));
    }

    #[test]
    fn test_oversized_embedding_length_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semantic_model.bin");
        // One symbol whose vector claims 2^40 components
        let mut bytes = 1u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&4u64.to_le_bytes());
        bytes.extend_from_slice(b"FISH");
        bytes.extend_from_slice(&(1u64 << 40).to_le_bytes());
        bytes.extend_from_slice(&0.5f64.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let err = EmbeddingTable::load(&path).unwrap_err();
        assert!(matches!(err, ModelLoadError::Decode { .. }), "{:?}", err);

        // Same for an oversized symbol name
        let mut bytes = 1u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(1u64 << 40).to_le_bytes());
        bytes.extend_from_slice(b"FISH");
        std::fs::write(&path, &bytes).unwrap();

        let err = EmbeddingTable::load(&path).unwrap_err();
        assert!(matches!(err, ModelLoadError::Decode { .. }), "{:?}", err);
    }

    #[test]
    fn test_dictionary_lookup_falls_back_to_normalized_form() {
        let mut entries = BTreeMap::new();
        entries.insert("DOT_CIRCLE".to_string(), json!({"meaning": "field focus"}));
        let dictionary = DictionaryEnricher::new(entries);

        assert_eq!(
            dictionary.annotate("DOT_CIRCLE"),
            Some(json!({"meaning": "field focus"}))
        );
        assert_eq!(
            dictionary.annotate(" dot circle "),
            Some(json!({"meaning": "field focus"}))
        );
        assert_eq!(dictionary.annotate("FISH"), None);
        assert_eq!(dictionary.refine_score("DOT_CIRCLE", 0.7), 0.7);
    }

    #[test]
    fn test_dictionary_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.json");
        assert!(matches!(
            DictionaryEnricher::load(&path),
            Err(ModelLoadError::Io { .. })
        ));

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            DictionaryEnricher::load(&path),
            Err(ModelLoadError::Decode { .. })
        ));
    }
}
