//! Detect command handler.
//!
//! Shows what the pipeline would decide for a document without chunking it:
//! language profile, domain, structural features and the Auto selection.

use super::{build_pipeline, collect_documents, ChunkingArgs};
use clap::Args;
use rechunk_chunking::{resolve_profile, CancellationFlag, DocumentFeatures};
use rechunk_core::{config::AppConfig, AppResult};
use std::path::PathBuf;
use tracing::instrument;

/// Show detected language, domain, features and Auto strategy choice
#[derive(Args, Debug)]
pub struct DetectCommand {
    /// Files or directories to inspect
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub chunking: ChunkingArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DetectCommand {
    #[instrument(name = "detect", skip_all)]
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing detect command");

        let options = self.chunking.to_options(config)?;
        let pipeline = build_pipeline(config)?;
        let cancel = CancellationFlag::new();

        let mut rows = Vec::new();
        for document in collect_documents(&self.paths)? {
            let profile = resolve_profile(&document.content, &options);
            let features = DocumentFeatures::extract(&document.content, profile);
            let selection = pipeline
                .selector()
                .select(&document.content, profile, pipeline.registry(), &options, &cancel)
                .await?;

            if self.json {
                rows.push(serde_json::json!({
                    "path": document.path,
                    "language": profile.language_code,
                    "languageName": profile.name,
                    "features": features,
                    "tags": features.tags(),
                    "selection": selection,
                }));
            } else {
                println!("{}", document.path.display());
                println!("  language:  {} ({})", profile.language_code, profile.name);
                println!("  domain:    {}", features.domain.as_str());
                println!("  tags:      {}", features.tags().join(", "));
                println!(
                    "  structure: headers={} code={} tables={} lists={} paragraphs={}",
                    features.has_headers,
                    features.has_code,
                    features.has_tables,
                    features.has_lists,
                    features.paragraph_count
                );
                println!(
                    "  strategy:  {} via {:?} (confidence {:.2})",
                    selection.strategy, selection.source, selection.confidence
                );
                println!("  reasoning: {}", selection.reasoning);
            }
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }

        Ok(())
    }
}
