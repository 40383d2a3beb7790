//! Configuration loading, validation and path resolution
//!
//! Tests that manipulate ISR_MODEL_CONFIG are marked #[serial] so they do
//! not race each other.

use isr_common::config::{resolve_config_path, ModelConfig, CONFIG_ENV_VAR};
use isr_common::Error;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

const FULL_JSON: &str = r#"{
  "algorithm": {
    "pattern_recognition": {
      "parameters": { "window_size": 3, "min_pattern_repeats": 2, "similarity_threshold": 0.8 }
    },
    "semantic_mapping": {
      "parameters": {
        "field_bias_weights": { "Quantum": 1.0, "Scalar": 0.8, "Consciousness": 1.2, "Geometric": 0.9 }
      }
    },
    "resonance_model": {
      "parameters": { "harmonic_bands": [1, 2, 3], "fractal_depth_weight": 1.5, "symmetry_coupling_factor": 0.7 }
    },
    "markov_model": { "model_file": "./models/markov_model.bin" }
  },
  "output": { "decoded_sequences_file": "./output/decoded_sequences.json" },
  "logging": { "enabled": false, "file": "./logs/run.txt" }
}"#;

fn json_with_pattern(window_size: i64, repeats: i64, threshold: f64) -> String {
    format!(
        r#"{{
  "algorithm": {{
    "pattern_recognition": {{
      "parameters": {{ "window_size": {}, "min_pattern_repeats": {}, "similarity_threshold": {} }}
    }},
    "semantic_mapping": {{ "parameters": {{ "field_bias_weights": {{}} }} }}
  }},
  "output": {{ "decoded_sequences_file": "out.json" }}
}}"#,
        window_size, repeats, threshold
    )
}

#[test]
fn test_full_json_configuration() {
    let config = ModelConfig::from_json_str(FULL_JSON).unwrap();

    let pattern = &config.algorithm.pattern_recognition.parameters;
    assert_eq!(pattern.window_size, 3);
    assert_eq!(pattern.min_pattern_repeats, 2);
    assert_eq!(pattern.similarity_threshold, 0.8);

    let weights = &config.algorithm.semantic_mapping.parameters.field_bias_weights;
    assert_eq!(weights.len(), 4);
    assert_eq!(weights["Consciousness"], 1.2);

    let resonance = &config.algorithm.resonance_model.parameters;
    assert_eq!(resonance.harmonic_bands, vec![1, 2, 3]);
    assert_eq!(resonance.fractal_depth_weight, 1.5);

    let markov = config.algorithm.markov_model.as_ref().unwrap();
    assert_eq!(markov.model_file, PathBuf::from("./models/markov_model.bin"));
    assert_eq!(markov.probability_floor, 0.001);
    assert_eq!(markov.default_probability, 0.01);

    assert!(!config.logging.enabled);
    assert_eq!(config.logging.level, "info");
    assert!(config.runtime.workers.is_none());
}

#[test]
fn test_resonance_and_logging_defaults() {
    let config = ModelConfig::from_json_str(&json_with_pattern(2, 2, 0.5)).unwrap();

    let resonance = &config.algorithm.resonance_model.parameters;
    assert_eq!(resonance.harmonic_bands, vec![1, 3, 5, 7]);
    assert_eq!(resonance.fractal_depth_weight, 1.25);
    assert_eq!(resonance.symmetry_coupling_factor, 0.85);

    assert!(config.logging.enabled);
    assert_eq!(config.logging.file, PathBuf::from("./logs/decoding_log.txt"));
    assert!(config.algorithm.markov_model.is_none());
}

#[test]
fn test_non_positive_window_size_rejected() {
    for window_size in [0, -3] {
        let err = ModelConfig::from_json_str(&json_with_pattern(window_size, 2, 0.5)).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {:?}", err);
        assert!(err.is_fatal());
    }
}

#[test]
fn test_threshold_outside_unit_interval_rejected() {
    let err = ModelConfig::from_json_str(&json_with_pattern(2, 2, 1.5)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_negative_repeats_rejected_zero_accepted() {
    let err = ModelConfig::from_json_str(&json_with_pattern(2, -1, 0.5)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    // Zero means every window qualifies on repeats alone
    let config = ModelConfig::from_json_str(&json_with_pattern(2, 0, 0.5)).unwrap();
    assert_eq!(config.algorithm.pattern_recognition.parameters.min_pattern_repeats, 0);
}

#[test]
fn test_missing_required_parameter_is_config_error() {
    let content = r#"{
      "algorithm": {
        "pattern_recognition": { "parameters": { "window_size": 3, "min_pattern_repeats": 2 } },
        "semantic_mapping": { "parameters": { "field_bias_weights": {} } }
      },
      "output": { "decoded_sequences_file": "out.json" }
    }"#;
    let err = ModelConfig::from_json_str(content).unwrap_err();
    match err {
        Error::Config(msg) => assert!(msg.contains("similarity_threshold"), "{}", msg),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_non_positive_harmonic_band_rejected() {
    let mut config = ModelConfig::from_json_str(FULL_JSON).unwrap();
    config.algorithm.resonance_model.parameters.harmonic_bands = vec![1, 0];
    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

#[test]
fn test_toml_configuration_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model_config.toml");
    std::fs::write(
        &path,
        r#"
[algorithm.pattern_recognition.parameters]
window_size = 2
min_pattern_repeats = 1
similarity_threshold = 0.5

[algorithm.semantic_mapping.parameters.field_bias_weights]
Quantum = 1.0
Scalar = 1.0
Consciousness = 1.0
Geometric = 1.0

[output]
decoded_sequences_file = "out/decoded.json"

[runtime]
workers = 2
"#,
    )
    .unwrap();

    let config = ModelConfig::load(&path).unwrap();
    assert_eq!(config.algorithm.pattern_recognition.parameters.window_size, 2);
    assert_eq!(config.runtime.workers, Some(2));
    assert_eq!(
        config.output.decoded_sequences_file,
        PathBuf::from("out/decoded.json")
    );
}

#[test]
fn test_missing_file_is_config_error() {
    let err = ModelConfig::load(Path::new("/nonexistent/isr/model_config.json")).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_malformed_json_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model_config.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = ModelConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_cli_argument_wins_over_environment() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.json");
    let resolved = resolve_config_path(Some(Path::new("/tmp/from-cli.json"))).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, PathBuf::from("/tmp/from-cli.json"));
}

#[test]
#[serial]
fn test_environment_variable_used_without_cli_argument() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.json");
    let resolved = resolve_config_path(None).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, PathBuf::from("/tmp/from-env.json"));
}
