//! Command handlers for the rechunk CLI.
//!
//! Shared pieces live here: document collection, chunking flags and
//! pipeline construction from the loaded configuration.

pub mod chunk;
pub mod detect;
pub mod estimate;
pub mod strategies;

// Re-export command types for convenience
pub use chunk::ChunkCommand;
pub use detect::DetectCommand;
pub use estimate::EstimateCommand;
pub use strategies::StrategiesCommand;

use clap::Args;
use rechunk_chunking::selector::SelectorSettings;
use rechunk_chunking::{ChunkPipeline, ChunkingOptions, RefinedContent, StrategyName};
use rechunk_core::{config::AppConfig, AppError, AppResult};
use serde_json::json;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Chunking flags shared by `chunk`, `estimate` and `detect`.
#[derive(Args, Debug, Clone, Default)]
pub struct ChunkingArgs {
    /// Strategy (auto, fixed_size, paragraph, semantic, smart, intelligent)
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Maximum chunk size in tokens
    #[arg(long)]
    pub max: Option<usize>,

    /// Minimum chunk size in tokens
    #[arg(long)]
    pub min: Option<usize>,

    /// Overlap between consecutive chunks in tokens
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Language code; detected from the text when omitted
    #[arg(short, long)]
    pub language: Option<String>,

    /// Drop chunks whose importance is below this value
    #[arg(long)]
    pub importance_threshold: Option<f32>,

    /// Bias auto selection toward fast strategies
    #[arg(long, conflicts_with = "prefer_quality")]
    pub prefer_speed: bool,

    /// Bias auto selection toward high-quality strategies
    #[arg(long)]
    pub prefer_quality: bool,
}

impl ChunkingArgs {
    /// Options from the config file, with flags applied on top.
    pub fn to_options(&self, config: &AppConfig) -> AppResult<ChunkingOptions> {
        let mut options = ChunkingOptions::from_config(&config.chunking);

        if let Some(strategy) = &self.strategy {
            options.strategy = StrategyName::parse(strategy);
        }
        let max = self.max.unwrap_or(options.max_chunk_size);
        let min = self.min.unwrap_or(options.min_chunk_size);
        let overlap = self.overlap.unwrap_or(options.overlap_size);
        options = options.with_sizes(max, min, overlap);
        if let Some(language) = &self.language {
            options = options.with_language(language);
        }
        if let Some(threshold) = self.importance_threshold {
            options = options.with_importance_threshold(threshold);
        }
        if self.prefer_speed {
            options = options.with_strategy_option("prefer_speed", json!(true));
        }
        if self.prefer_quality {
            options = options.with_strategy_option("prefer_quality", json!(true));
        }

        options.validate()?;
        Ok(options)
    }
}

/// Pipeline wired with the configured completion service, if any.
pub fn build_pipeline(config: &AppConfig) -> AppResult<ChunkPipeline> {
    let pipeline = ChunkPipeline::new();
    match rechunk_llm::from_config(&config.llm)? {
        Some(service) => {
            tracing::debug!(
                provider = service.provider_name(),
                "Auto selection will consult the completion service"
            );
            Ok(pipeline.with_completion_service(service, SelectorSettings::from(&config.selection)))
        }
        None => Ok(pipeline),
    }
}

/// A text document read from disk.
#[derive(Debug)]
pub struct Document {
    pub path: PathBuf,
    pub content: RefinedContent,
}

/// Read every file named in `paths`, walking directories.
///
/// Explicitly named files must be readable UTF-8 text; files found while
/// walking a directory are skipped with a warning when they are not.
pub fn collect_documents(paths: &[PathBuf]) -> AppResult<Vec<Document>> {
    let mut documents = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
            {
                let entry = entry.map_err(|e| AppError::Other(format!("Failed to walk {:?}: {}", path, e)))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                match read_document(entry.path()) {
                    Ok(document) => documents.push(document),
                    Err(e) => tracing::warn!("Skipping {:?}: {}", entry.path(), e),
                }
            }
        } else {
            documents.push(read_document(path)?);
        }
    }

    tracing::debug!("Collected {} documents", documents.len());
    Ok(documents)
}

fn read_document(path: &Path) -> AppResult<Document> {
    let text = std::fs::read_to_string(path)?;
    Ok(Document {
        path: path.to_path_buf(),
        content: RefinedContent::new(text),
    })
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// First `limit` characters of `text` on one line.
pub fn preview(text: &str, limit: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= limit {
        flat
    } else {
        let cut: String = flat.chars().take(limit).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_walks_directories_and_skips_hidden() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.md"), "# A\n\nText.").unwrap();
        std::fs::create_dir(temp.path().join("nested")).unwrap();
        std::fs::write(temp.path().join("nested/b.txt"), "More text.").unwrap();
        std::fs::create_dir(temp.path().join(".hidden")).unwrap();
        std::fs::write(temp.path().join(".hidden/c.txt"), "Secret.").unwrap();
        std::fs::write(temp.path().join("binary.bin"), [0xff, 0xfe, 0x00]).unwrap();

        let documents = collect_documents(&[temp.path().to_path_buf()]).unwrap();
        let names: Vec<String> = documents
            .iter()
            .map(|d| d.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.md", "b.txt"]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = collect_documents(&[PathBuf::from("/definitely/not/here.txt")]);
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_flags_override_config() {
        let config = AppConfig::default();
        let args = ChunkingArgs {
            strategy: Some("Fixed-Size".to_string()),
            max: Some(100),
            overlap: Some(10),
            prefer_speed: true,
            ..Default::default()
        };

        let options = args.to_options(&config).unwrap();
        assert_eq!(options.strategy, StrategyName::FixedSize);
        assert_eq!(options.max_chunk_size, 100);
        assert_eq!(options.min_chunk_size, 50);
        assert!(options.flag("prefer_speed"));
    }

    #[test]
    fn test_invalid_flags_rejected() {
        let args = ChunkingArgs {
            max: Some(10),
            ..Default::default()
        };
        assert!(matches!(
            args.to_options(&AppConfig::default()),
            Err(AppError::Chunking(_))
        ));
    }

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("a\n\nb   c", 10), "a b c");
        assert_eq!(preview("abcdefghij", 4), "abcd…");
    }
}
