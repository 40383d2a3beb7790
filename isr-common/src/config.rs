//! Model configuration loading and validation
//!
//! The model configuration is read once at startup. JSON is the historical
//! format (`models/model_config.json`); TOML is accepted when the file has a
//! `.toml` extension. Every failure here is an [`Error::Config`] and aborts
//! the run before any sequence is touched.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `ISR_MODEL_CONFIG` environment variable
//! 3. `./models/model_config.json` in the working directory
//! 4. `<user config dir>/isr/model_config.toml` (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable naming the model configuration file
pub const CONFIG_ENV_VAR: &str = "ISR_MODEL_CONFIG";

/// Working-directory relative default location
pub const DEFAULT_CONFIG_PATH: &str = "./models/model_config.json";

/// Complete model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub algorithm: AlgorithmConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// `algorithm.*` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    pub pattern_recognition: Section<PatternParameters>,
    pub semantic_mapping: Section<SemanticParameters>,
    #[serde(default)]
    pub resonance_model: Section<ResonanceParameters>,
    /// Optional trained transition model used to gate candidate patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markov_model: Option<MarkovConfig>,
    /// Optional precomputed symbol embeddings used to refine semantic scores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<EmbeddingConfig>,
    /// Optional symbol dictionary attached to decoded symbols
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<DictionaryConfig>,
}

/// Wrapper matching the `{ "parameters": { ... } }` nesting of each stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section<T> {
    pub parameters: T,
}

/// `algorithm.pattern_recognition.parameters`
///
/// Signed integers so that zero or negative values reach validation and
/// produce a readable error instead of a deserializer message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternParameters {
    pub window_size: i64,
    pub min_pattern_repeats: i64,
    /// Minimum distinct-symbol ratio of a window (a uniqueness ratio,
    /// despite the historical name)
    pub similarity_threshold: f64,
}

/// `algorithm.semantic_mapping.parameters`
///
/// Completeness of the weight vector is checked per symbol at scoring time,
/// not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticParameters {
    pub field_bias_weights: BTreeMap<String, f64>,
}

/// `algorithm.resonance_model.parameters`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResonanceParameters {
    #[serde(default = "default_harmonic_bands")]
    pub harmonic_bands: Vec<i64>,
    #[serde(default = "default_fractal_depth_weight")]
    pub fractal_depth_weight: f64,
    #[serde(default = "default_symmetry_coupling_factor")]
    pub symmetry_coupling_factor: f64,
}

impl Default for ResonanceParameters {
    fn default() -> Self {
        Self {
            harmonic_bands: default_harmonic_bands(),
            fractal_depth_weight: default_fractal_depth_weight(),
            symmetry_coupling_factor: default_symmetry_coupling_factor(),
        }
    }
}

fn default_harmonic_bands() -> Vec<i64> {
    vec![1, 3, 5, 7]
}

fn default_fractal_depth_weight() -> f64 {
    1.25
}

fn default_symmetry_coupling_factor() -> f64 {
    0.85
}

/// `algorithm.markov_model`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkovConfig {
    pub model_file: PathBuf,
    /// Windows whose joint transition probability falls below this are dropped
    #[serde(default = "default_probability_floor")]
    pub probability_floor: f64,
    /// Probability assumed for a symbol pair never seen in training
    #[serde(default = "default_transition_probability")]
    pub default_probability: f64,
}

fn default_probability_floor() -> f64 {
    0.001
}

fn default_transition_probability() -> f64 {
    0.01
}

/// `algorithm.embedding_model`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model_file: PathBuf,
}

/// `algorithm.dictionary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryConfig {
    pub file: PathBuf,
}

/// `output.*` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub decoded_sequences_file: PathBuf,
}

/// `logging.*` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

fn default_logging_enabled() -> bool {
    true
}

fn default_log_file() -> PathBuf {
    PathBuf::from("./logs/decoding_log.txt")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `runtime.*` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Decode worker count; available parallelism when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl ModelConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read configuration {}: {}", path.display(), e))
        })?;
        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);
        let config = if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
        .map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        Ok(config)
    }

    /// Parse and validate JSON configuration text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid JSON configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate TOML configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        let pattern = &self.algorithm.pattern_recognition.parameters;
        if pattern.window_size <= 0 {
            return Err(Error::Config(format!(
                "window_size must be positive, got {}",
                pattern.window_size
            )));
        }
        if pattern.min_pattern_repeats < 0 {
            return Err(Error::Config(format!(
                "min_pattern_repeats must not be negative, got {}",
                pattern.min_pattern_repeats
            )));
        }
        check_unit_interval("similarity_threshold", pattern.similarity_threshold)?;

        let resonance = &self.algorithm.resonance_model.parameters;
        if resonance.harmonic_bands.is_empty() {
            return Err(Error::Config("harmonic_bands must not be empty".to_string()));
        }
        if let Some(band) = resonance.harmonic_bands.iter().find(|b| **b <= 0) {
            return Err(Error::Config(format!(
                "harmonic_bands must be positive integers, got {}",
                band
            )));
        }
        check_finite("fractal_depth_weight", resonance.fractal_depth_weight)?;
        check_finite("symmetry_coupling_factor", resonance.symmetry_coupling_factor)?;

        for (category, weight) in &self.algorithm.semantic_mapping.parameters.field_bias_weights {
            check_finite(&format!("field_bias_weights.{}", category), *weight)?;
        }

        if let Some(markov) = &self.algorithm.markov_model {
            check_unit_interval("markov_model.probability_floor", markov.probability_floor)?;
            check_unit_interval("markov_model.default_probability", markov.default_probability)?;
        }

        if self.output.decoded_sequences_file.as_os_str().is_empty() {
            return Err(Error::Config(
                "output.decoded_sequences_file must not be empty".to_string(),
            ));
        }

        if self.runtime.workers == Some(0) {
            return Err(Error::Config("runtime.workers must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn check_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::Config(format!("{} must be a finite number", name)))
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{} must lie in [0, 1], got {}",
            name, value
        )))
    }
}

/// Resolve the configuration file path
///
/// See the module documentation for the priority order.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: Working directory default
    let local = PathBuf::from(DEFAULT_CONFIG_PATH);
    if local.exists() {
        return Ok(local);
    }

    // Priority 4: Per-user config directory
    if let Some(user) = dirs::config_dir().map(|d| d.join("isr").join("model_config.toml")) {
        if user.exists() {
            return Ok(user);
        }
    }

    Err(Error::Config(format!(
        "No model configuration found. Pass --config, set {}, or create {}",
        CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH
    )))
}
