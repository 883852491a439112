//! Chunking strategies.
//!
//! A strategy turns the document text into ordered byte ranges
//! ([`Segment`]s). Scoring, ids and metadata are added afterwards by the
//! pipeline, so strategies only decide where to cut.

mod fixed;
mod intelligent;
mod merging;
mod paragraph;
mod sentence;

pub(crate) use fixed::fixed_windows;
pub(crate) use merging::{drop_blank, merge_undersized_tail};

use crate::budget::{estimate_tokens, Budget};
use crate::cancel::CancellationFlag;
use crate::language::LanguageProfile;
use crate::options::{ChunkingOptions, StrategyName};
use crate::types::{RefinedContent, StructuralRole};
use rechunk_core::ChunkError;
use std::ops::Range;

/// Quality penalty applied to segments produced by a recovery path.
pub const RECOVERY_PENALTY: f32 = 0.15;

/// A contiguous byte range of the document chosen as one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub range: Range<usize>,
    /// Known role; detected from the content when `None`.
    pub role: Option<StructuralRole>,
    pub contextual_header: Option<String>,
    pub warnings: Vec<String>,
    pub quality_penalty: f32,
    /// Must not be merged with neighbours.
    pub atomic: bool,
}

impl Segment {
    pub fn new(range: Range<usize>) -> Self {
        Self {
            range,
            role: None,
            contextual_header: None,
            warnings: Vec::new(),
            quality_penalty: 0.0,
            atomic: false,
        }
    }

    pub fn with_role(mut self, role: StructuralRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_header(mut self, header: Option<String>) -> Self {
        self.contextual_header = header;
        self
    }

    pub fn atomic(mut self) -> Self {
        self.atomic = true;
        self
    }

    /// Record a recovered failure and lower the quality score.
    pub fn warn(mut self, message: impl Into<String>, penalty: f32) -> Self {
        self.warnings.push(message.into());
        self.quality_penalty += penalty;
        self
    }

    pub fn text<'a>(&self, text: &'a str) -> &'a str {
        &text[self.range.clone()]
    }
}

/// Output of one [`ChunkingStrategy::segment_step`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentStep {
    pub segments: Vec<Segment>,
    /// Byte offset the next step starts at; the text length when done.
    pub next: usize,
}

impl SegmentStep {
    pub fn finished(end: usize) -> Self {
        Self {
            segments: Vec::new(),
            next: end,
        }
    }
}

/// Everything a strategy may read during one pass.
pub struct SegmentContext<'a> {
    pub content: &'a RefinedContent,
    pub options: &'a ChunkingOptions,
    pub profile: &'static LanguageProfile,
    pub cancel: &'a CancellationFlag,
}

impl<'a> SegmentContext<'a> {
    pub fn text(&self) -> &'a str {
        &self.content.text
    }

    pub fn budget(&self) -> Budget {
        Budget::from_options(self.options)
    }

    pub fn check_cancelled(&self) -> Result<(), ChunkError> {
        self.cancel.check()
    }
}

/// A pluggable chunking algorithm.
///
/// Implementations are shared across threads by the strategy registry.
/// Returning [`ChunkError::StrategyFailure`] makes the pipeline fall back to
/// fixed-size windows for the whole document.
pub trait ChunkingStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Ordered segments covering the document text.
    fn segment(&self, cx: &SegmentContext<'_>) -> Result<Vec<Segment>, ChunkError>;

    /// Segments for the part of the document starting at byte `from`,
    /// together with the byte offset the next step resumes at. Streaming
    /// calls this until the offset reaches the end of the text.
    ///
    /// The default segments the whole document in one step. Strategies
    /// that can cut without looking ahead override it so streamed chunks
    /// are produced as the strategy goes.
    fn segment_step(&self, cx: &SegmentContext<'_>, from: usize) -> Result<SegmentStep, ChunkError> {
        let end = cx.text().len();
        if from >= end {
            return Ok(SegmentStep::finished(end));
        }
        Ok(SegmentStep {
            segments: self.segment(cx)?,
            next: end,
        })
    }

    /// Cheap upper-level estimate of the number of chunks.
    fn estimate_chunk_count(&self, content: &RefinedContent, options: &ChunkingOptions) -> usize {
        estimate_by_tokens(&content.text, options.max_chunk_size, options.overlap_size)
    }
}

/// Chunks needed for `text` at `per_chunk` tokens with `overlap` carried over.
pub(crate) fn estimate_by_tokens(text: &str, per_chunk: usize, overlap: usize) -> usize {
    let tokens = estimate_tokens(text);
    if tokens == 0 {
        return 0;
    }
    let step = per_chunk.saturating_sub(overlap).max(1);
    if tokens <= per_chunk {
        1
    } else {
        1 + (tokens - per_chunk).div_ceil(step)
    }
}

/// The built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinStrategy {
    FixedSize,
    Paragraph,
    Semantic,
    Smart,
    Intelligent,
}

impl BuiltinStrategy {
    pub const ALL: [BuiltinStrategy; 5] = [
        BuiltinStrategy::FixedSize,
        BuiltinStrategy::Paragraph,
        BuiltinStrategy::Semantic,
        BuiltinStrategy::Smart,
        BuiltinStrategy::Intelligent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinStrategy::FixedSize => "fixed_size",
            BuiltinStrategy::Paragraph => "paragraph",
            BuiltinStrategy::Semantic => "semantic",
            BuiltinStrategy::Smart => "smart",
            BuiltinStrategy::Intelligent => "intelligent",
        }
    }

    pub fn from_name(name: &StrategyName) -> Option<Self> {
        match name {
            StrategyName::FixedSize => Some(BuiltinStrategy::FixedSize),
            StrategyName::Paragraph => Some(BuiltinStrategy::Paragraph),
            StrategyName::Semantic => Some(BuiltinStrategy::Semantic),
            StrategyName::Smart => Some(BuiltinStrategy::Smart),
            StrategyName::Intelligent => Some(BuiltinStrategy::Intelligent),
            StrategyName::Auto | StrategyName::Custom(_) => None,
        }
    }
}

impl ChunkingStrategy for BuiltinStrategy {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn segment(&self, cx: &SegmentContext<'_>) -> Result<Vec<Segment>, ChunkError> {
        match self {
            BuiltinStrategy::FixedSize => fixed::segment(cx),
            BuiltinStrategy::Paragraph => paragraph::segment(cx),
            BuiltinStrategy::Semantic => sentence::segment(cx, sentence::PackMode::Strict),
            BuiltinStrategy::Smart => sentence::segment(cx, sentence::PackMode::Flex),
            BuiltinStrategy::Intelligent => intelligent::segment(cx),
        }
    }

    fn estimate_chunk_count(&self, content: &RefinedContent, options: &ChunkingOptions) -> usize {
        let max = options.max_chunk_size;
        match self {
            BuiltinStrategy::FixedSize => {
                estimate_by_tokens(&content.text, max, options.overlap_size)
            }
            BuiltinStrategy::Paragraph => estimate_by_tokens(&content.text, max, 0),
            // Sentence packing rarely fills a chunk to the brim.
            BuiltinStrategy::Semantic | BuiltinStrategy::Smart => {
                estimate_by_tokens(&content.text, (max * 17 / 20).max(1), options.overlap_size)
            }
            BuiltinStrategy::Intelligent => {
                estimate_by_tokens(&content.text, (max * 3 / 4).max(1), options.overlap_size)
            }
        }
    }
}

/// Fixed-size windows over `range` replacing a strategy that could not
/// segment it.
pub(crate) fn recover_with_fixed(
    cx: &SegmentContext<'_>,
    range: Range<usize>,
    budget: &Budget,
    error: &ChunkError,
) -> Result<Vec<Segment>, ChunkError> {
    tracing::warn!(error = %error, start = range.start, end = range.end, "Falling back to fixed-size windows");
    let message = format!("{error}; fell back to fixed-size windows");
    Ok(fixed_windows(cx.text(), range, budget, false, cx.cancel)?
        .into_iter()
        .map(|segment| segment.warn(message.clone(), RECOVERY_PENALTY))
        .collect())
}
