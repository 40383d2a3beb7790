//! isr-decoder - Sequence decoding run
//!
//! Loads the model configuration and sequence input, decodes every
//! sequence id, and atomically writes the decoded result file.
//!
//! **Usage:**
//! ```bash
//! isr-decoder [--config <file>] [--sequences <file>] [--output <file>] [--workers <n>]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use isr_common::config::{resolve_config_path, ModelConfig, CONFIG_ENV_VAR};
use isr_common::logging::{init_tracing, sink_from_config};
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Command-line arguments for isr-decoder
#[derive(Parser, Debug)]
#[command(name = "isr-decoder")]
#[command(about = "Decode inscription symbol sequences into scored patterns")]
#[command(version)]
struct Args {
    /// Model configuration file (JSON, or TOML with a .toml extension)
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Sequence input file
    #[arg(short, long, default_value = "./data/sequences.json")]
    sequences: PathBuf,

    /// Override output.decoded_sequences_file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override runtime.workers
    #[arg(short, long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration problems abort before anything else happens
    let config_path = resolve_config_path(args.config.as_deref())?;
    let mut config = ModelConfig::load(&config_path)
        .with_context(|| format!("Failed to load model configuration {}", config_path.display()))?;
    if let Some(output) = args.output {
        config.output.decoded_sequences_file = output;
    }
    if args.workers.is_some() {
        config.runtime.workers = args.workers;
    }
    config.validate()?;

    init_tracing(&config.logging.level);
    info!("Starting isr-decoder v{}", env!("CARGO_PKG_VERSION"));
    info!("Model configuration: {}", config_path.display());

    let log = sink_from_config(&config.logging);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight sequences");
            signal_cancel.cancel();
        }
    });

    let report = isr_decoder::run_decode(&config, &args.sequences, log, cancel)
        .await
        .context("Decoding run failed")?;

    info!("Run {}: {}", report.run_id, report.summary());
    if !report.skipped.is_empty() {
        warn!("Skipped ids: {}", report.skipped.join(", "));
    }
    if !report.failed.is_empty() {
        warn!("Failed ids: {}", report.failed.join(", "));
    }
    Ok(())
}
