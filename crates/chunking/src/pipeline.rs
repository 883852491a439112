//! Chunking pipeline orchestrator.
//!
//! 1. Validate options and resolve the strategy (Auto goes through the selector)
//! 2. Resolve the language profile
//! 3. Segment with the chosen strategy, recovering strategy failures
//! 4. Finalise segments into scored, located chunks, one at a time
//! 5. Apply the importance threshold as chunks are emitted

use crate::budget::estimate_tokens;
use crate::cancel::CancellationFlag;
use crate::classify::{
    count_keyword_hits, detect_document_domain, detect_structural_role,
    extract_technical_keywords, DEFAULT_TECHNICAL_KEYWORDS,
};
use crate::language::{detect_and_get_profile, get_profile, LanguageProfile};
use crate::offsets::CharOffsets;
use crate::options::{ChunkingOptions, StrategyName};
use crate::scoring;
use crate::selector::{AutoSelector, SelectorSettings, StrategyHandle, StrategyMetadata, StrategyRegistry};
use crate::strategy::{
    drop_blank, recover_with_fixed, BuiltinStrategy, ChunkingStrategy, Segment, SegmentContext,
    SegmentStep,
};
use crate::types::{
    ChunkLocation, ChunkMetadata, DocumentChunk, DocumentDomain, RefinedContent, Section,
    SelectionOutcome,
};
use futures::stream::{self, Stream};
use rechunk_core::ChunkError;
use rechunk_llm::CompletionService;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Arc;

/// Strategy option letting an unknown strategy name degrade to Auto.
pub const ALLOW_AUTO_FALLBACK_KEY: &str = "allow_auto_fallback";

/// Keywords reported per chunk by the intelligent strategy.
const KEYWORDS_PER_CHUNK: usize = 10;

const ID_HEX_LEN: usize = 32;

/// Language profile for a document: explicit option, then the `language`
/// hint, then script detection.
pub fn resolve_profile(content: &RefinedContent, options: &ChunkingOptions) -> &'static LanguageProfile {
    if let Some(code) = options.language() {
        return get_profile(code);
    }
    match content.hint_str("language").map(str::trim) {
        Some(code) if !code.is_empty() => get_profile(code),
        _ => detect_and_get_profile(&content.text),
    }
}

/// Strategy that will run, after resolution.
struct ResolvedStrategy {
    name: String,
    handle: StrategyHandle,
    selection: Option<SelectionOutcome>,
}

/// Entry point of the chunking core.
///
/// Cheap to share: the registry is behind an `Arc` and strategies keep no
/// per-call state, so one pipeline can chunk many documents concurrently.
#[derive(Debug, Clone)]
pub struct ChunkPipeline {
    registry: Arc<StrategyRegistry>,
    selector: AutoSelector,
}

impl Default for ChunkPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkPipeline {
    /// Pipeline with the built-in strategies and a rules-only selector.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(StrategyRegistry::with_builtins()),
            selector: AutoSelector::rules_only(),
        }
    }

    pub fn with_selector(mut self, selector: AutoSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Let the Auto selector consult `service`.
    pub fn with_completion_service(
        self,
        service: Arc<dyn CompletionService>,
        settings: SelectorSettings,
    ) -> Self {
        self.with_selector(AutoSelector::new(Some(service), settings))
    }

    pub fn with_registry(mut self, registry: Arc<StrategyRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<StrategyRegistry> {
        &self.registry
    }

    pub fn selector(&self) -> &AutoSelector {
        &self.selector
    }

    /// Register a custom strategy; Auto ranks it alongside the built-ins.
    pub fn register_strategy(
        &self,
        name: impl Into<String>,
        metadata: StrategyMetadata,
        strategy: Arc<dyn ChunkingStrategy>,
    ) {
        self.registry.register(name, metadata, strategy);
    }

    pub async fn chunk(
        &self,
        content: &RefinedContent,
        options: &ChunkingOptions,
    ) -> Result<Vec<DocumentChunk>, ChunkError> {
        self.chunk_with_cancel(content, options, &CancellationFlag::new())
            .await
    }

    /// Chunk a document, aborting with [`ChunkError::Cancelled`] once
    /// `cancel` is set. Partial output is discarded.
    pub async fn chunk_with_cancel(
        &self,
        content: &RefinedContent,
        options: &ChunkingOptions,
        cancel: &CancellationFlag,
    ) -> Result<Vec<DocumentChunk>, ChunkError> {
        match self.prepare(content, options, cancel).await? {
            Some(run) => run.collect(cancel),
            None => Ok(Vec::new()),
        }
    }

    /// Synchronous chunking. Auto uses the rule-based ranking only.
    pub fn chunk_blocking(
        &self,
        content: &RefinedContent,
        options: &ChunkingOptions,
    ) -> Result<Vec<DocumentChunk>, ChunkError> {
        let needs_selection = self.validate(options)?;
        if content.text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let profile = resolve_profile(content, options);
        let selection = needs_selection.then(|| {
            self.selector
                .select_by_rules(content, profile, &self.registry, options)
        });
        let resolved = self.resolve(options, selection)?;
        ChunkRun::new(content, options, profile, resolved).collect(&CancellationFlag::new())
    }

    /// Chunks as a stream in emission order.
    ///
    /// Strategy selection happens before the first item. After that the
    /// strategy is driven one [`ChunkingStrategy::segment_step`] at a time
    /// and each chunk is finalised right before it is yielded.
    ///
    /// The importance threshold is applied per chunk: chunks below it are
    /// skipped as they are built, and when none pass, the most important
    /// chunk is yielded after the last step. The stream therefore yields
    /// exactly what [`chunk`](Self::chunk) returns.
    ///
    /// Cancellation is checked before every item; a cancelled stream yields
    /// one `Err(Cancelled)` and ends.
    pub fn chunk_stream<'a>(
        &'a self,
        content: &'a RefinedContent,
        options: &'a ChunkingOptions,
        cancel: CancellationFlag,
    ) -> impl Stream<Item = Result<DocumentChunk, ChunkError>> + 'a {
        enum State<'r> {
            Pending,
            Running(Box<ChunkRun<'r>>),
            Done,
        }

        stream::unfold(State::Pending, move |state| {
            let cancel = cancel.clone();
            async move {
                let mut run = match state {
                    State::Pending => match self.prepare(content, options, &cancel).await {
                        Ok(Some(run)) => run,
                        Ok(None) => return None,
                        Err(error) => return Some((Err(error), State::Done)),
                    },
                    State::Running(run) => run,
                    State::Done => return None,
                };
                match run.next_chunk(&cancel) {
                    Ok(Some(chunk)) => Some((Ok(chunk), State::Running(run))),
                    Ok(None) => None,
                    Err(error) => Some((Err(error), State::Done)),
                }
            }
        })
    }

    /// Expected number of chunks, without segmenting. Auto is resolved by
    /// rules; anything unresolvable is estimated as Smart.
    pub fn estimate_chunk_count(&self, content: &RefinedContent, options: &ChunkingOptions) -> usize {
        if content.text.trim().is_empty() {
            return 0;
        }

        let selection = match self.validate(options) {
            Ok(true) => Some(self.selector.select_by_rules(
                content,
                resolve_profile(content, options),
                &self.registry,
                options,
            )),
            _ => None,
        };

        match self.resolve(options, selection) {
            Ok(resolved) => resolved
                .handle
                .as_strategy()
                .estimate_chunk_count(content, options),
            Err(_) => BuiltinStrategy::Smart.estimate_chunk_count(content, options),
        }
    }

    /// Reject invalid options. Returns whether Auto selection is needed.
    fn validate(&self, options: &ChunkingOptions) -> Result<bool, ChunkError> {
        options.validate()?;
        match &options.strategy {
            StrategyName::Auto => Ok(true),
            StrategyName::Custom(name) if !self.registry.contains(name) => {
                if options.flag(ALLOW_AUTO_FALLBACK_KEY) {
                    tracing::warn!(strategy = %name, "Unknown strategy, falling back to auto selection");
                    Ok(true)
                } else {
                    Err(ChunkError::InvalidOptions(format!(
                        "unknown strategy '{name}'"
                    )))
                }
            }
            _ => Ok(false),
        }
    }

    fn resolve(
        &self,
        options: &ChunkingOptions,
        selection: Option<SelectionOutcome>,
    ) -> Result<ResolvedStrategy, ChunkError> {
        let wanted = match &selection {
            Some(outcome) => StrategyName::parse(&outcome.strategy),
            None => options.strategy.clone(),
        };

        if let Some(entry) = self.registry.get(wanted.as_str()) {
            return Ok(ResolvedStrategy {
                name: entry.name,
                handle: entry.handle,
                selection,
            });
        }

        let builtin = match BuiltinStrategy::from_name(&wanted) {
            Some(builtin) => builtin,
            None if selection.is_some() => BuiltinStrategy::Smart,
            None => {
                return Err(ChunkError::InvalidOptions(format!(
                    "unknown strategy '{wanted}'"
                )))
            }
        };
        Ok(ResolvedStrategy {
            name: builtin.as_str().to_string(),
            handle: StrategyHandle::Builtin(builtin),
            selection,
        })
    }

    /// Validate, select and resolve. `None` when the text is blank.
    async fn prepare<'a>(
        &self,
        content: &'a RefinedContent,
        options: &'a ChunkingOptions,
        cancel: &CancellationFlag,
    ) -> Result<Option<Box<ChunkRun<'a>>>, ChunkError> {
        let needs_selection = self.validate(options)?;
        if content.text.trim().is_empty() {
            return Ok(None);
        }
        cancel.check()?;

        let profile = resolve_profile(content, options);
        let selection = if needs_selection {
            Some(
                self.selector
                    .select(content, profile, &self.registry, options, cancel)
                    .await?,
            )
        } else {
            None
        };

        let resolved = self.resolve(options, selection)?;
        Ok(Some(Box::new(ChunkRun::new(content, options, profile, resolved))))
    }
}

/// One chunking pass over a document.
///
/// Drives the strategy step by step, recovering strategy failures with
/// fixed-size windows from the failing step onwards, and finalises segments
/// into located, scored chunks as they are requested.
struct ChunkRun<'a> {
    content: &'a RefinedContent,
    options: &'a ChunkingOptions,
    profile: &'static LanguageProfile,
    resolved: ResolvedStrategy,
    offsets: CharOffsets,
    domain: DocumentDomain,
    page_breaks: Vec<usize>,
    /// Byte offset the next strategy step starts at
    cursor: usize,
    /// Segments not yet finalised, with the completeness of their step
    queue: VecDeque<(Segment, f32)>,
    produced_any: bool,
    filter: ImportanceFilter,
    finished: bool,
}

impl<'a> ChunkRun<'a> {
    fn new(
        content: &'a RefinedContent,
        options: &'a ChunkingOptions,
        profile: &'static LanguageProfile,
        resolved: ResolvedStrategy,
    ) -> Self {
        let text = content.text.as_str();
        Self {
            offsets: CharOffsets::new(text),
            domain: detect_document_domain(text, DEFAULT_TECHNICAL_KEYWORDS),
            page_breaks: content.hint_offsets("page_breaks"),
            cursor: 0,
            queue: VecDeque::new(),
            produced_any: false,
            filter: ImportanceFilter::new(options.importance_threshold),
            finished: false,
            content,
            options,
            profile,
            resolved,
        }
    }

    fn collect(mut self, cancel: &CancellationFlag) -> Result<Vec<DocumentChunk>, ChunkError> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.next_chunk(cancel)? {
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    /// Next chunk in emission order, or `None` once the document is done.
    fn next_chunk(&mut self, cancel: &CancellationFlag) -> Result<Option<DocumentChunk>, ChunkError> {
        let text_len = self.content.text.len();
        loop {
            cancel.check()?;

            if let Some((segment, completeness)) = self.queue.pop_front() {
                let chunk = self.build(&segment, completeness);
                if let Some(chunk) = self.filter.offer(chunk) {
                    return Ok(Some(chunk));
                }
                continue;
            }

            if self.cursor < text_len {
                self.step(cancel)?;
                continue;
            }

            if !self.produced_any {
                // Only blank segments came back: the whole text is one chunk.
                self.produced_any = true;
                self.queue.push_back((Segment::new(0..text_len), 1.0));
                continue;
            }

            if self.finished {
                return Ok(None);
            }
            self.finished = true;
            let last = self.filter.finish();
            tracing::info!(
                "Chunking complete: {} chunks created from {} bytes with {}",
                self.filter.emitted,
                text_len,
                self.resolved.name
            );
            return Ok(last);
        }
    }

    fn step(&mut self, cancel: &CancellationFlag) -> Result<(), ChunkError> {
        let text = self.content.text.as_str();
        let from = self.cursor;
        let cx = SegmentContext {
            content: self.content,
            options: self.options,
            profile: self.profile,
            cancel,
        };
        let name = self.resolved.name.as_str();

        let step = self
            .resolved
            .handle
            .as_strategy()
            .segment_step(&cx, from)
            .and_then(|step| {
                if step.next <= from || step.next > text.len() || !text.is_char_boundary(step.next) {
                    return Err(ChunkError::strategy(
                        name,
                        format!("step from byte {from} resumed at byte {}", step.next),
                    ));
                }
                Ok(SegmentStep {
                    segments: check_ranges(step.segments, text, name)?,
                    next: step.next,
                })
            });
        let step = match step {
            Ok(step) => step,
            Err(error) if error.is_recoverable() => SegmentStep {
                segments: recover_with_fixed(&cx, from..text.len(), &cx.budget(), &error)?,
                next: text.len(),
            },
            Err(error) => return Err(error),
        };

        let segments = drop_blank(step.segments, text);
        let window = from..step.next;
        let ranges: Vec<Range<usize>> = segments
            .iter()
            .map(|segment| {
                let start = segment.range.start.clamp(window.start, window.end) - from;
                let end = segment.range.end.clamp(window.start, window.end) - from;
                start..end
            })
            .collect();
        let completeness = scoring::completeness(&text[window.clone()], &ranges);

        tracing::debug!(
            strategy = %self.resolved.name,
            language = self.profile.language_code,
            from,
            next = step.next,
            segments = segments.len(),
            "Segmentation step complete"
        );

        self.produced_any |= !segments.is_empty();
        self.queue
            .extend(segments.into_iter().map(|segment| (segment, completeness)));
        self.cursor = step.next;
        Ok(())
    }

    /// Located, scored chunk for `segment`. Index and id are set on emission.
    fn build(&self, segment: &Segment, completeness: f32) -> DocumentChunk {
        let text = self.content.text.as_str();
        let raw = segment.text(text);
        let body = raw.trim();
        let start = segment.range.start + (raw.len() - raw.trim_start().len());
        let end = start + body.len();

        let tokens = estimate_tokens(body);
        let role = segment.role.unwrap_or_else(|| detect_structural_role(body));
        let keyword_hits = count_keyword_hits(body, DEFAULT_TECHNICAL_KEYWORDS);
        let structure = scoring::structure_confidence(body, role, self.profile);

        let start_char = self.offsets.to_char(start);
        let end_char = self.offsets.to_char(end);
        let section_path = Some(Section::path_to(&self.content.sections, start_char))
            .filter(|path| !path.is_empty());
        let (start_page, end_page) = if self.page_breaks.is_empty() {
            (None, None)
        } else {
            (
                Some(page_at(&self.page_breaks, start_char)),
                Some(page_at(&self.page_breaks, end_char.saturating_sub(1).max(start_char))),
            )
        };
        let with_keywords = self.resolved.name == BuiltinStrategy::Intelligent.as_str();

        DocumentChunk {
            id: String::new(),
            index: 0,
            content: body.to_string(),
            location: ChunkLocation {
                start_char,
                end_char,
                start_page,
                end_page,
                section_path,
            },
            quality: scoring::quality(
                structure,
                completeness,
                scoring::consistency(tokens, self.options.max_chunk_size),
                segment.quality_penalty,
            ),
            importance: scoring::importance(body, role, tokens, keyword_hits),
            density: scoring::density(body),
            strategy_used: self.resolved.name.clone(),
            estimated_tokens: u32::try_from(tokens).unwrap_or(u32::MAX),
            structural_role: role,
            document_domain: self.domain,
            contextual_header: segment.contextual_header.clone(),
            technical_keywords: if with_keywords {
                extract_technical_keywords(body, DEFAULT_TECHNICAL_KEYWORDS, KEYWORDS_PER_CHUNK)
            } else {
                Vec::new()
            },
            metadata: ChunkMetadata {
                language_code: self.profile.language_code.to_string(),
                selection: self.resolved.selection.clone(),
                warnings: segment.warnings.clone(),
            },
        }
    }
}

/// Segment ranges must lie inside the text on character boundaries.
fn check_ranges(
    segments: Vec<Segment>,
    text: &str,
    strategy: &str,
) -> Result<Vec<Segment>, ChunkError> {
    for segment in &segments {
        let Range { start, end } = segment.range;
        if start > end || end > text.len() || !text.is_char_boundary(start) || !text.is_char_boundary(end)
        {
            return Err(ChunkError::strategy(
                strategy,
                format!("segment range {start}..{end} is not valid for the document"),
            ));
        }
    }
    Ok(segments)
}

/// 1-based page holding character `pos`; `breaks` are sorted page starts.
fn page_at(breaks: &[usize], pos: usize) -> u32 {
    let before = breaks.partition_point(|&b| b <= pos);
    u32::try_from(before + 1).unwrap_or(u32::MAX)
}

/// Importance threshold applied in emission order.
///
/// Chunks below the threshold are dropped. When none pass, the most
/// important chunk (the earliest on ties) is emitted by [`finish`]. Indices
/// and ids follow emission order so they stay sequential.
///
/// [`finish`]: ImportanceFilter::finish
#[derive(Debug)]
struct ImportanceFilter {
    threshold: f32,
    emitted: usize,
    best: Option<DocumentChunk>,
}

impl ImportanceFilter {
    fn new(threshold: f32) -> Self {
        Self {
            threshold,
            emitted: 0,
            best: None,
        }
    }

    fn offer(&mut self, chunk: DocumentChunk) -> Option<DocumentChunk> {
        if self.threshold <= 0.0 || chunk.importance >= self.threshold {
            self.best = None;
            return Some(self.emit(chunk));
        }
        let better = self
            .best
            .as_ref()
            .map_or(true, |best| chunk.importance > best.importance);
        if self.emitted == 0 && better {
            self.best = Some(chunk);
        }
        None
    }

    fn finish(&mut self) -> Option<DocumentChunk> {
        if self.emitted > 0 {
            return None;
        }
        let best = self.best.take()?;
        Some(self.emit(best))
    }

    fn emit(&mut self, mut chunk: DocumentChunk) -> DocumentChunk {
        chunk.index = self.emitted;
        chunk.id = chunk_id(&chunk);
        self.emitted += 1;
        chunk
    }
}

/// Stable id from strategy, position and content.
fn chunk_id(chunk: &DocumentChunk) -> String {
    let mut hasher = Sha256::new();
    hasher.update(chunk.strategy_used.as_bytes());
    hasher.update(b"|");
    hasher.update(chunk.index.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(chunk.location.start_char.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(chunk.location.end_char.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(chunk.content.as_bytes());

    let mut id = format!("{:x}", hasher.finalize());
    id.truncate(ID_HEX_LEN);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SelectionSource, StructuralRole};
    use serde_json::json;

    fn sentences(n: usize) -> String {
        (0..n)
            .map(|i| format!("Sentence number {i} talks about the weather today."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[tokio::test]
    async fn test_empty_input_yields_no_chunks() {
        let pipeline = ChunkPipeline::new();
        let chunks = pipeline
            .chunk(&RefinedContent::new("  \n\t "), &ChunkingOptions::default())
            .await
            .unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_options_rejected() {
        let pipeline = ChunkPipeline::new();
        let options = ChunkingOptions::default().with_sizes(10, 20, 5);
        let result = pipeline.chunk(&RefinedContent::new("Some text."), &options).await;
        assert!(matches!(result, Err(ChunkError::InvalidOptions(_))));
    }

    #[tokio::test]
    async fn test_unknown_strategy_with_and_without_fallback() {
        let pipeline = ChunkPipeline::new();
        let content = RefinedContent::new(sentences(5));

        let strict = ChunkingOptions::new(StrategyName::parse("mystery"));
        assert!(matches!(
            pipeline.chunk(&content, &strict).await,
            Err(ChunkError::InvalidOptions(_))
        ));

        let lenient = strict.with_strategy_option(ALLOW_AUTO_FALLBACK_KEY, json!(true));
        let chunks = pipeline.chunk(&content, &lenient).await.unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks[0].metadata.selection.is_some());
    }

    #[tokio::test]
    async fn test_chunks_are_indexed_and_identified() {
        let pipeline = ChunkPipeline::new();
        let options = ChunkingOptions::new(StrategyName::Semantic).with_sizes(40, 5, 8);
        let chunks = pipeline
            .chunk(&RefinedContent::new(sentences(20)), &options)
            .await
            .unwrap();

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.id.len(), 32);
            assert_eq!(chunk.strategy_used, "semantic");
            assert_eq!(chunk.metadata.language_code, "en");
            assert!(chunk.metadata.selection.is_none());
            assert!((0.0..=1.0).contains(&chunk.quality));
        }
        assert_ne!(chunks[0].id, chunks[1].id);
    }

    #[tokio::test]
    async fn test_auto_attaches_selection() {
        let pipeline = ChunkPipeline::new();
        let chunks = pipeline
            .chunk(&RefinedContent::new(sentences(4)), &ChunkingOptions::default())
            .await
            .unwrap();
        let selection = chunks[0].metadata.selection.as_ref().unwrap();
        assert_eq!(selection.source, SelectionSource::Rules);
        assert_eq!(chunks[0].strategy_used, selection.strategy);
    }

    #[test]
    fn test_language_resolution_order() {
        let korean = "이것은 한국어 문장입니다. 두 번째 문장입니다.";
        let content = RefinedContent::new(korean);
        assert_eq!(resolve_profile(&content, &ChunkingOptions::default()).language_code, "ko");

        let hinted = RefinedContent::new(korean).with_hint("language", json!("fr"));
        assert_eq!(resolve_profile(&hinted, &ChunkingOptions::default()).language_code, "fr");

        let forced = ChunkingOptions::default().with_language("de");
        assert_eq!(resolve_profile(&hinted, &forced).language_code, "de");
    }

    #[test]
    fn test_importance_threshold_keeps_best_chunk() {
        let pipeline = ChunkPipeline::new();
        let text = format!("# Weather\n\n{}", sentences(3));
        let options = ChunkingOptions::new(StrategyName::Intelligent)
            .with_sizes(20, 1, 0)
            .with_importance_threshold(1.0);
        let chunks = pipeline
            .chunk_blocking(&RefinedContent::new(text), &options)
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_importance_filter_in_emission_order() {
        let options = ChunkingOptions::new(StrategyName::FixedSize).with_sizes(10, 1, 0);
        let mut chunks = ChunkPipeline::new()
            .chunk_blocking(&RefinedContent::new(sentences(4)), &options)
            .unwrap();
        assert!(chunks.len() >= 3);
        chunks.truncate(3);
        for (chunk, importance) in chunks.iter_mut().zip([0.5, 0.9, 0.4]) {
            chunk.importance = importance;
        }

        let mut filter = ImportanceFilter::new(0.7);
        let kept: Vec<_> = chunks.iter().cloned().filter_map(|c| filter.offer(c)).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].importance, 0.9);
        assert_eq!(kept[0].index, 0);
        assert!(filter.finish().is_none());

        for chunk in &mut chunks {
            chunk.importance = 0.5;
        }
        let mut filter = ImportanceFilter::new(0.7);
        assert!(chunks.iter().cloned().all(|c| filter.offer(c).is_none()));
        let best = filter.finish().unwrap();
        assert_eq!(best.content, chunks[0].content);
        assert_eq!(best.index, 0);
        assert_eq!(best.id, chunk_id(&best));
    }

    #[test]
    fn test_page_numbers_from_hint() {
        assert_eq!(page_at(&[10, 20], 0), 1);
        assert_eq!(page_at(&[10, 20], 10), 2);
        assert_eq!(page_at(&[10, 20], 25), 3);
    }

    #[test]
    fn test_estimate_matches_fixed_windows() {
        let pipeline = ChunkPipeline::new();
        let content = RefinedContent::new("word ".repeat(200));
        let options = ChunkingOptions::new(StrategyName::FixedSize).with_sizes(50, 10, 10);
        assert_eq!(pipeline.estimate_chunk_count(&content, &options), 5);
        assert_eq!(pipeline.chunk_blocking(&content, &options).unwrap().len(), 5);
        assert_eq!(
            pipeline.estimate_chunk_count(&RefinedContent::new(""), &options),
            0
        );
    }

    #[test]
    fn test_role_falls_back_to_detection() {
        let pipeline = ChunkPipeline::new();
        let options = ChunkingOptions::new(StrategyName::FixedSize).with_sizes(50, 1, 0);
        let chunks = pipeline
            .chunk_blocking(&RefinedContent::new("- one\n- two\n- three"), &options)
            .unwrap();
        assert_eq!(chunks[0].structural_role, StructuralRole::List);
    }
}
