//! Transition model training
//!
//! Counts successor transitions over a sequence corpus and writes the
//! normalized probability table as a bincode artifact for decode runs.
//!
//! **Usage:**
//! ```bash
//! train-markov [--sequences <file>] [--output <file>]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use isr_common::logging::init_tracing;
use isr_decoder::services::TransitionModel;
use isr_decoder::SequenceCollection;
use std::path::PathBuf;
use tracing::info;

/// Transition model trainer
#[derive(Parser, Debug)]
#[clap(name = "train-markov")]
#[clap(about = "Train the symbol transition model from a sequence corpus")]
struct Args {
    /// Training corpus in sequence input format
    #[clap(long, default_value = "./data/sequences.json")]
    sequences: PathBuf,

    /// Destination of the trained model artifact
    #[clap(long, default_value = "./models/markov_model.bin")]
    output: PathBuf,
}

fn main() -> Result<()> {
    init_tracing("info");
    let args = Args::parse();

    info!("Loading sequences from {}", args.sequences.display());
    let collection = SequenceCollection::load(&args.sequences)?;

    info!("Training transition model...");
    let model = TransitionModel::train(&collection);
    info!("Model trained with {} symbols", model.symbol_count());

    model
        .save(&args.output)
        .with_context(|| format!("Failed to save model to {}", args.output.display()))?;
    info!("Transition model saved to {}", args.output.display());
    Ok(())
}
