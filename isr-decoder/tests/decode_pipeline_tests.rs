//! End-to-end decode behaviour
//!
//! Covers:
//! - Parallel decoding matches sequential decoding
//! - Combined score contract on every decoded symbol
//! - Lossless result file round-trip
//! - Atomic output and cancellation leaving previous results untouched
//! - Corrupt transition model downgraded to a warning
//! - Fatal configuration and data errors

use isr_common::config::ModelConfig;
use isr_common::logging::NullSink;
use isr_common::Error;
use isr_decoder::models::round_score;
use isr_decoder::services::output_writer::{load_results, write_results};
use isr_decoder::services::{DecodeContext, DecodeOrchestrator, TransitionModel};
use isr_decoder::{run_decode, SequenceCollection};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const SEQUENCES: &str = r#"{
  "M-101": { "symbol_sequences": [
      ["FISH", "JAR", "FISH", "JAR", "ARROW", "FISH", "JAR"],
      ["KNOT", "GRID", "KNOT", "GRID", "KNOT"]
  ] },
  "H-17": { "symbol_sequences": [["SPIRAL", "SQUARE", "SPIRAL", "SQUARE", "SPIRAL", "SQUARE"]] },
  "L-3": { "symbol_sequences": [["DOT_CIRCLE"]] },
  "K-9": { "symbol_sequences": [] },
  "C-44": { "symbol_sequences": [["A", "B", "C", "A", "B", "C", "A", "B", "C"], ["B", "C"]] }
}"#;

fn config_json(output: &Path, extra_algorithm: &str) -> String {
    format!(
        r#"{{
  "algorithm": {{
    "pattern_recognition": {{ "parameters": {{ "window_size": 2, "min_pattern_repeats": 1, "similarity_threshold": 0.8 }} }},
    "semantic_mapping": {{ "parameters": {{ "field_bias_weights": {{ "Quantum": 1.0, "Scalar": 0.8, "Consciousness": 1.2, "Geometric": 0.9 }} }} }},
    "resonance_model": {{ "parameters": {{ "harmonic_bands": [1, 3, 5, 7], "fractal_depth_weight": 1.25, "symmetry_coupling_factor": 0.85 }} }}
    {}
  }},
  "output": {{ "decoded_sequences_file": {:?} }},
  "logging": {{ "enabled": false }},
  "runtime": {{ "workers": 4 }}
}}"#,
        extra_algorithm,
        output.to_string_lossy()
    )
}

fn write_sequences(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("sequences.json");
    std::fs::write(&path, SEQUENCES).unwrap();
    path
}

fn orchestrator(config: &ModelConfig) -> DecodeOrchestrator {
    let context = DecodeContext::from_config(config, &NullSink).unwrap();
    DecodeOrchestrator::new(Arc::new(context), Arc::new(NullSink))
}

#[test]
fn test_parallel_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let config =
        ModelConfig::from_json_str(&config_json(&dir.path().join("out.json"), "")).unwrap();
    let collection = SequenceCollection::from_json_str(SEQUENCES).unwrap();
    let orchestrator = orchestrator(&config);

    let parallel = orchestrator
        .decode_all(&collection, &CancellationToken::new())
        .unwrap();
    let sequential = orchestrator.decode_all_sequential(&collection, &CancellationToken::new());

    assert_eq!(parallel.results, sequential.results);
    assert_eq!(parallel.report.processed, 5);
    assert_eq!(sequential.report.processed, 5);
    assert_ne!(parallel.report.run_id, sequential.report.run_id);
}

#[test]
fn test_combined_score_contract_and_resonance_by_length() {
    let dir = tempfile::tempdir().unwrap();
    let config =
        ModelConfig::from_json_str(&config_json(&dir.path().join("out.json"), "")).unwrap();
    let collection = SequenceCollection::from_json_str(SEQUENCES).unwrap();
    let run = orchestrator(&config).decode_all(&collection, &CancellationToken::new()).unwrap();

    for (id, result) in &run.results {
        let inputs = &collection.get(id).unwrap().symbol_sequences;
        assert_eq!(result.decoded_sequences.len(), inputs.len());
        for (decoded, input) in result.decoded_sequences.iter().zip(inputs) {
            assert_eq!(decoded.len(), input.len());
            for symbol in decoded {
                assert_eq!(
                    symbol.combined_score,
                    round_score((symbol.semantic_strength + symbol.harmonic_resonance) / 2.0)
                );
                assert!(symbol.harmonic_resonance >= 0.0);
            }
        }
    }

    // Same length, different symbols: identical resonance
    let m101 = &run.results["M-101"].decoded_sequences[1];
    let c44 = &run.results["C-44"].decoded_sequences[1];
    let h17 = &run.results["H-17"].decoded_sequences[0];
    assert_eq!(m101.len(), 5);
    assert_eq!(c44.len(), 2);
    assert_eq!(h17.len(), 6);
    assert_eq!(
        run.results["C-44"].decoded_sequences[1][0].harmonic_resonance,
        run.results["C-44"].decoded_sequences[1][1].harmonic_resonance
    );
}

#[test]
fn test_expected_patterns() {
    let dir = tempfile::tempdir().unwrap();
    let config =
        ModelConfig::from_json_str(&config_json(&dir.path().join("out.json"), "")).unwrap();
    let collection = SequenceCollection::from_json_str(SEQUENCES).unwrap();
    let run = orchestrator(&config).decode_all(&collection, &CancellationToken::new()).unwrap();

    let symbols = |id: &str| -> Vec<Vec<String>> {
        run.results[id]
            .patterns_detected
            .iter()
            .map(|p| p.symbols.clone())
            .collect()
    };

    assert_eq!(
        symbols("M-101"),
        vec![vec!["FISH", "JAR"], vec!["KNOT", "GRID"], vec!["GRID", "KNOT"]]
    );
    assert_eq!(
        symbols("H-17"),
        vec![vec!["SPIRAL", "SQUARE"], vec!["SQUARE", "SPIRAL"]]
    );
    assert!(symbols("L-3").is_empty());
    assert!(symbols("K-9").is_empty());
    assert!(run.results["K-9"].decoded_sequences.is_empty());
}

#[tokio::test]
async fn test_run_writes_reloadable_results() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("output").join("decoded_sequences.json");
    let config = ModelConfig::from_json_str(&config_json(&output, "")).unwrap();
    let sequences = write_sequences(dir.path());

    let report = run_decode(&config, &sequences, Arc::new(NullSink), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.processed, 5);
    assert!(report.skipped.is_empty() && report.failed.is_empty());

    let reloaded = load_results(&output).unwrap();
    let keys: Vec<&String> = reloaded.keys().collect();
    assert_eq!(keys, vec!["C-44", "H-17", "K-9", "L-3", "M-101"]);

    // Round-trip through the writer is lossless
    let again = dir.path().join("again.json");
    write_results(&again, &reloaded, &NullSink).unwrap();
    assert_eq!(load_results(&again).unwrap(), reloaded);
}

#[tokio::test]
async fn test_cancelled_run_keeps_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("decoded_sequences.json");
    std::fs::write(&output, "{\"previous\": true}").unwrap();
    let config = ModelConfig::from_json_str(&config_json(&output, "")).unwrap();
    let sequences = write_sequences(dir.path());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = run_decode(&config, &sequences, Arc::new(NullSink), cancel)
        .await
        .unwrap();

    assert_eq!(report.cancelled, 5);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "{\"previous\": true}");
}

#[tokio::test]
async fn test_corrupt_transition_model_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("decoded_sequences.json");
    let model_path = dir.path().join("markov_model.bin");
    std::fs::write(&model_path, b"not a model").unwrap();
    let extra = format!(
        r#", "markov_model": {{ "model_file": {:?} }}"#,
        model_path.to_string_lossy()
    );
    let config = ModelConfig::from_json_str(&config_json(&output, &extra)).unwrap();
    let sequences = write_sequences(dir.path());

    let report = run_decode(&config, &sequences, Arc::new(NullSink), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.processed, 5);
    let results = load_results(&output).unwrap();
    assert!(results["M-101"]
        .patterns_detected
        .iter()
        .all(|p| p.transition_probability.is_none()));
}

#[tokio::test]
async fn test_trained_transition_model_gates_patterns() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("decoded_sequences.json");
    let model_path = dir.path().join("models").join("markov_model.bin");

    // Corpus never shows GRID -> KNOT
    let corpus = SequenceCollection::from_json_str(
        r#"{ "T": { "symbol_sequences": [["FISH", "JAR", "ARROW"], ["KNOT", "GRID"], ["SPIRAL", "SQUARE", "SPIRAL"]] } }"#,
    )
    .unwrap();
    TransitionModel::train(&corpus).save(&model_path).unwrap();

    let extra = format!(
        r#", "markov_model": {{ "model_file": {:?}, "probability_floor": 0.1, "default_probability": 0.01 }}"#,
        model_path.to_string_lossy()
    );
    let config = ModelConfig::from_json_str(&config_json(&output, &extra)).unwrap();
    let sequences = write_sequences(dir.path());

    run_decode(&config, &sequences, Arc::new(NullSink), CancellationToken::new())
        .await
        .unwrap();

    let results = load_results(&output).unwrap();
    let m101: Vec<Vec<String>> = results["M-101"]
        .patterns_detected
        .iter()
        .map(|p| p.symbols.clone())
        .collect();
    assert_eq!(m101, vec![vec!["FISH", "JAR"], vec!["KNOT", "GRID"]]);
    assert!(results["M-101"]
        .patterns_detected
        .iter()
        .all(|p| p.transition_probability == Some(1.0)));
}

#[tokio::test]
async fn test_missing_sequences_is_fatal_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("decoded_sequences.json");
    let config = ModelConfig::from_json_str(&config_json(&output, "")).unwrap();

    let err = run_decode(
        &config,
        &dir.path().join("missing.json"),
        Arc::new(NullSink),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Data(_)));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_incomplete_weight_vector_skips_every_unit() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("decoded_sequences.json");
    let mut config = ModelConfig::from_json_str(&config_json(&output, "")).unwrap();
    config
        .algorithm
        .semantic_mapping
        .parameters
        .field_bias_weights
        .remove("Geometric");
    let sequences = write_sequences(dir.path());

    let report = run_decode(&config, &sequences, Arc::new(NullSink), CancellationToken::new())
        .await
        .unwrap();

    // K-9 has no symbols to score, so it still decodes
    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped.len(), 4);
    let results = load_results(&output).unwrap();
    assert_eq!(results.keys().collect::<Vec<_>>(), vec!["K-9"]);
}
