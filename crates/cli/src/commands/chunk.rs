//! Chunk command handler.
//!
//! Splits documents into chunks and prints them as text, a JSON array or
//! JSON lines (streamed as they are produced).

use super::{build_pipeline, collect_documents, preview, ChunkingArgs, Document};
use clap::Args;
use futures::StreamExt;
use rechunk_chunking::{CancellationFlag, ChunkPipeline, ChunkingOptions, DocumentChunk};
use rechunk_core::{config::AppConfig, AppResult};
use std::path::PathBuf;
use tracing::instrument;

/// Split documents into retrieval chunks
#[derive(Args, Debug)]
pub struct ChunkCommand {
    /// Files or directories to chunk
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub chunking: ChunkingArgs,

    /// Output as a JSON array
    #[arg(long, conflicts_with = "jsonl")]
    pub json: bool,

    /// Output one JSON object per chunk, as chunks are produced
    #[arg(long)]
    pub jsonl: bool,
}

impl ChunkCommand {
    #[instrument(name = "chunk", skip_all)]
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chunk command for {} path(s)", self.paths.len());

        let options = self.chunking.to_options(config)?;
        let pipeline = build_pipeline(config)?;
        let documents = collect_documents(&self.paths)?;

        let mut all = Vec::new();
        for document in &documents {
            if self.jsonl {
                stream_document(&pipeline, document, &options).await?;
                continue;
            }

            let chunks = chunk_document(&pipeline, document, &options).await?;
            if self.json {
                all.push(serde_json::json!({
                    "path": document.path,
                    "chunks": chunks,
                }));
            } else {
                print_text(&document.path, &chunks);
            }
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&all)?);
        }

        Ok(())
    }
}

#[instrument(name = "document", level = "debug", skip_all, fields(path = %document.path.display()))]
async fn chunk_document(
    pipeline: &ChunkPipeline,
    document: &Document,
    options: &ChunkingOptions,
) -> AppResult<Vec<DocumentChunk>> {
    Ok(pipeline.chunk(&document.content, options).await?)
}

/// One JSON line per chunk, printed as soon as the pipeline yields it.
#[instrument(name = "document", level = "debug", skip_all, fields(path = %document.path.display()))]
async fn stream_document(
    pipeline: &ChunkPipeline,
    document: &Document,
    options: &ChunkingOptions,
) -> AppResult<()> {
    let mut stream = Box::pin(pipeline.chunk_stream(&document.content, options, CancellationFlag::new()));
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let line = serde_json::json!({
            "path": document.path,
            "chunk": chunk,
        });
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}

fn print_text(path: &std::path::Path, chunks: &[DocumentChunk]) {
    let strategy = chunks.first().map_or("-", |c| c.strategy_used.as_str());
    println!("{} ({} chunks, {})", path.display(), chunks.len(), strategy);

    if let Some(selection) = chunks.first().and_then(|c| c.metadata.selection.as_ref()) {
        println!(
            "  selected {} via {:?} (confidence {:.2}): {}",
            selection.strategy, selection.source, selection.confidence, selection.reasoning
        );
    }

    for chunk in chunks {
        let header = chunk
            .contextual_header
            .as_deref()
            .map(|h| format!(" [{h}]"))
            .unwrap_or_default();
        println!(
            "  #{:<3} {:<10} {:>4} tok  q={:.2} i={:.2}{}  {}",
            chunk.index,
            chunk.structural_role.as_str(),
            chunk.estimated_tokens,
            chunk.quality,
            chunk.importance,
            header,
            preview(&chunk.content, 60)
        );
        for warning in &chunk.metadata.warnings {
            println!("        warning: {warning}");
        }
    }
}
