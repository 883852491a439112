//! Document chunking core for retrieval pipelines.
//!
//! Turns refined document text into ordered, scored chunks:
//! - Language profiles and a script-aware sentence/section segmenter
//! - Structural-role and document-domain heuristics
//! - Token budgeting shared by every strategy
//! - Five built-in strategies plus user-registered ones
//! - Auto selection with an optional completion service
//!
//! # Example
//! ```no_run
//! use rechunk_chunking::{ChunkPipeline, ChunkingOptions, RefinedContent, StrategyName};
//!
//! # async fn example() -> Result<(), rechunk_core::ChunkError> {
//! let pipeline = ChunkPipeline::new();
//! let content = RefinedContent::new("# Intro\n\nSome text. More text.");
//! let options = ChunkingOptions::new(StrategyName::Intelligent);
//! for chunk in pipeline.chunk(&content, &options).await? {
//!     println!("{} {:?}", chunk.index, chunk.structural_role);
//! }
//! # Ok(())
//! # }
//! ```

pub mod budget;
pub mod cancel;
pub mod classify;
pub mod language;
pub mod offsets;
pub mod options;
pub mod pipeline;
pub mod scoring;
pub mod selector;
pub mod strategy;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use cancel::CancellationFlag;
pub use language::{detect_and_get_profile, get_profile, supported_languages, LanguageProfile};
pub use options::{ChunkingOptions, StrategyName};
pub use pipeline::{resolve_profile, ChunkPipeline};
pub use selector::{AutoSelector, DocumentFeatures, SelectorSettings, StrategyMetadata, StrategyRegistry};
pub use strategy::{BuiltinStrategy, ChunkingStrategy, Segment, SegmentContext, SegmentStep};
pub use types::{
    ChunkLocation, ChunkMetadata, DocumentChunk, DocumentDomain, RefinedContent, Section,
    SelectionOutcome, SelectionSource, StructuralRole,
};

use rechunk_core::ChunkError;

/// Chunk `content` with a default pipeline (built-in strategies, no
/// completion service).
pub async fn chunk(
    content: &RefinedContent,
    options: &ChunkingOptions,
) -> Result<Vec<DocumentChunk>, ChunkError> {
    ChunkPipeline::new().chunk(content, options).await
}

/// Expected chunk count for `content` under `options`, without chunking.
pub fn estimate_chunk_count(content: &RefinedContent, options: &ChunkingOptions) -> usize {
    ChunkPipeline::new().estimate_chunk_count(content, options)
}
