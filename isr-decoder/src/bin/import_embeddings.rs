//! Embedding artifact import
//!
//! Converts precomputed symbol embeddings exported as JSON
//! (`{ "<symbol>": [f64, ...] }`) into the bincode artifact read by the
//! embedding refinement stage.
//!
//! **Usage:**
//! ```bash
//! import-embeddings <embeddings.json> [--output <file>]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use isr_common::logging::init_tracing;
use isr_decoder::services::enrichment::EmbeddingTable;
use std::path::PathBuf;
use tracing::info;

/// Embedding artifact importer
#[derive(Parser, Debug)]
#[clap(name = "import-embeddings")]
#[clap(about = "Convert JSON symbol embeddings into the refinement artifact")]
struct Args {
    /// JSON embedding export
    input: PathBuf,

    /// Destination artifact
    #[clap(long, default_value = "./models/semantic_model.bin")]
    output: PathBuf,
}

fn main() -> Result<()> {
    init_tracing("info");
    let args = Args::parse();

    let table = EmbeddingTable::from_json_file(&args.input)?;
    table
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Saved {} embeddings to {}", table.len(), args.output.display());
    Ok(())
}
