//! Estimate command handler.

use super::{build_pipeline, collect_documents, ChunkingArgs};
use clap::Args;
use rechunk_chunking::budget::estimate_tokens;
use rechunk_core::{config::AppConfig, AppResult};
use std::path::PathBuf;
use tracing::instrument;

/// Estimate how many chunks documents would produce
#[derive(Args, Debug)]
pub struct EstimateCommand {
    /// Files or directories to estimate
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub chunking: ChunkingArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EstimateCommand {
    #[instrument(name = "estimate", skip_all)]
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing estimate command");

        let options = self.chunking.to_options(config)?;
        let pipeline = build_pipeline(config)?;
        let documents = collect_documents(&self.paths)?;

        let rows: Vec<serde_json::Value> = documents
            .iter()
            .map(|document| {
                serde_json::json!({
                    "path": document.path,
                    "tokens": estimate_tokens(&document.content.text),
                    "estimatedChunks": pipeline.estimate_chunk_count(&document.content, &options),
                })
            })
            .collect();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        } else {
            for (document, row) in documents.iter().zip(&rows) {
                println!(
                    "{}: {} tokens, ~{} chunks",
                    document.path.display(),
                    row["tokens"],
                    row["estimatedChunks"]
                );
            }
        }

        Ok(())
    }
}
