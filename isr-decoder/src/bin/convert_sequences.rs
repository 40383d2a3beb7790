//! Raw transcription conversion
//!
//! Normalizes a plain-text transcription file (one inscription per line,
//! whitespace-separated signs) into the sequence input format.
//!
//! **Usage:**
//! ```bash
//! convert-sequences <input.txt> [--output <file>]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use isr_common::logging::init_tracing;
use isr_common::persist::write_json_atomic;
use isr_decoder::services::converter::from_text_file;
use std::path::PathBuf;
use tracing::info;

/// Sequence input converter
#[derive(Parser, Debug)]
#[clap(name = "convert-sequences")]
#[clap(about = "Convert raw text transcriptions into sequence input JSON")]
struct Args {
    /// Raw text file, one inscription per line
    #[clap(default_value = "./data/raw/indus_sequences.txt")]
    input: PathBuf,

    /// Destination sequence file
    #[clap(long, default_value = "./data/sequences.json")]
    output: PathBuf,
}

fn main() -> Result<()> {
    init_tracing("info");
    let args = Args::parse();

    let collection = from_text_file(&args.input)?;
    write_json_atomic(&args.output, &collection)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Saved {} sequences to {}", collection.len(), args.output.display());
    Ok(())
}
