//! End-to-end scenarios through `ChunkPipeline`.

use super::{ENGLISH_PROSE, KOREAN_PROSE};
use crate::cancel::CancellationFlag;
use crate::language::{get_profile, split_sentences};
use crate::options::{ChunkingOptions, StrategyName};
use crate::pipeline::ChunkPipeline;
use crate::selector::StrategyMetadata;
use crate::strategy::{ChunkingStrategy, Segment, SegmentContext, SegmentStep};
use crate::types::{RefinedContent, Section, SelectionSource, StructuralRole};
use futures::StreamExt;
use rechunk_core::ChunkError;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// One segment per line.
struct PerLine;

impl ChunkingStrategy for PerLine {
    fn name(&self) -> &str {
        "per_line"
    }

    fn segment(&self, cx: &SegmentContext<'_>) -> Result<Vec<Segment>, ChunkError> {
        let mut segments = Vec::new();
        let mut offset = 0;
        for line in cx.text().split_inclusive('\n') {
            cx.check_cancelled()?;
            segments.push(Segment::new(offset..offset + line.len()));
            offset += line.len();
        }
        Ok(segments)
    }
}

/// Cuts one line per step and counts the steps taken.
struct LineSteps {
    steps: Arc<AtomicUsize>,
}

impl ChunkingStrategy for LineSteps {
    fn name(&self) -> &str {
        "line_steps"
    }

    fn segment(&self, cx: &SegmentContext<'_>) -> Result<Vec<Segment>, ChunkError> {
        let mut segments = Vec::new();
        let mut from = 0;
        while from < cx.text().len() {
            let step = self.segment_step(cx, from)?;
            segments.extend(step.segments);
            from = step.next;
        }
        Ok(segments)
    }

    fn segment_step(&self, cx: &SegmentContext<'_>, from: usize) -> Result<SegmentStep, ChunkError> {
        let rest = &cx.text()[from..];
        let len = rest.find('\n').map_or(rest.len(), |i| i + 1);
        self.steps.fetch_add(1, Ordering::SeqCst);
        Ok(SegmentStep {
            segments: vec![Segment::new(from..from + len)],
            next: from + len,
        })
    }
}

/// Returns a range past the end of the text.
struct OutOfBounds;

impl ChunkingStrategy for OutOfBounds {
    fn name(&self) -> &str {
        "out_of_bounds"
    }

    fn segment(&self, cx: &SegmentContext<'_>) -> Result<Vec<Segment>, ChunkError> {
        Ok(vec![Segment::new(0..cx.text().len() + 10)])
    }
}

#[tokio::test]
async fn test_language_detected_per_document() {
    let pipeline = ChunkPipeline::new();
    let options = ChunkingOptions::new(StrategyName::Smart);

    let korean = pipeline
        .chunk(&RefinedContent::new(KOREAN_PROSE), &options)
        .await
        .unwrap();
    assert!(korean.iter().all(|c| c.metadata.language_code == "ko"));

    let english = pipeline
        .chunk(&RefinedContent::new(ENGLISH_PROSE), &options)
        .await
        .unwrap();
    assert!(english.iter().all(|c| c.metadata.language_code == "en"));
}

#[test]
fn test_abbreviations_do_not_end_sentences() {
    let text = "Dr. Smith arrived at 5 p.m. He was late.";
    assert_eq!(split_sentences(text, get_profile("en")).len(), 2);
}

#[test]
fn test_title_abbreviation_then_time() {
    let text = "Dr. Smith went home. He arrived at 5pm.";
    let sentences: Vec<&str> = split_sentences(text, get_profile("en"))
        .iter()
        .map(|span| span.as_str(text).trim())
        .collect();
    assert_eq!(sentences, vec!["Dr. Smith went home.", "He arrived at 5pm."]);
}

#[test]
fn test_fixed_size_windows_share_overlap() {
    let words: Vec<String> = (0..200).map(|i| format!("w{i}")).collect();
    let content = RefinedContent::new(words.join(" "));
    let options = ChunkingOptions::new(StrategyName::FixedSize).with_sizes(50, 10, 10);

    let chunks = ChunkPipeline::new()
        .chunk_blocking(&content, &options)
        .unwrap();
    assert_eq!(chunks.len(), 5);

    for pair in chunks.windows(2) {
        let previous: Vec<&str> = pair[0].content.unicode_words().collect();
        let next: Vec<&str> = pair[1].content.unicode_words().collect();
        assert_eq!(previous[previous.len() - 10..], next[..10]);
    }
    assert_eq!(chunks[0].estimated_tokens, 50);
    assert_eq!(chunks[4].estimated_tokens, 40);
}

#[test]
fn test_code_block_kept_whole_under_heading() {
    let body: Vec<String> = (0..100).map(|i| format!("let x_{i} = {i};")).collect();
    let text = format!("# Guide\n\n```rust\n{}\n```\n", body.join("\n"));
    let options = ChunkingOptions::new(StrategyName::Intelligent).with_sizes(100, 10, 10);

    let chunks = ChunkPipeline::new()
        .chunk_blocking(&RefinedContent::new(text), &options)
        .unwrap();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].structural_role, StructuralRole::CodeBlock);
    assert_eq!(chunks[0].contextual_header.as_deref(), Some("Guide"));
    assert!(chunks[0].estimated_tokens > 100);
    assert!(chunks[0].metadata.warnings.is_empty());
}

#[test]
fn test_intelligent_reports_keywords() {
    let text = "# API\n\nThe API exposes one function per class. Each function returns JSON.";
    let options = ChunkingOptions::new(StrategyName::Intelligent);

    let chunks = ChunkPipeline::new()
        .chunk_blocking(&RefinedContent::new(text), &options)
        .unwrap();
    assert!(chunks[0].technical_keywords.contains(&"function".to_string()));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let result = ChunkPipeline::new()
        .chunk_with_cancel(
            &RefinedContent::new(ENGLISH_PROSE),
            &ChunkingOptions::new(StrategyName::Semantic),
            &cancel,
        )
        .await;
    assert_eq!(result, Err(ChunkError::Cancelled));
}

#[tokio::test]
async fn test_stream_matches_batch_and_stops_on_cancel() {
    let pipeline = ChunkPipeline::new();
    let content = RefinedContent::new(ENGLISH_PROSE);
    let options = ChunkingOptions::new(StrategyName::Semantic).with_sizes(30, 5, 5);

    let batch = pipeline.chunk(&content, &options).await.unwrap();
    let streamed: Vec<_> = pipeline
        .chunk_stream(&content, &options, CancellationFlag::new())
        .collect()
        .await;
    let streamed: Vec<_> = streamed.into_iter().map(Result::unwrap).collect();
    assert_eq!(streamed, batch);

    let cancel = CancellationFlag::new();
    let mut stream = Box::pin(pipeline.chunk_stream(&content, &options, cancel.clone()));
    assert!(matches!(stream.next().await, Some(Ok(_))));
    cancel.cancel();
    assert_eq!(stream.next().await, Some(Err(ChunkError::Cancelled)));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_stream_steps_strategy_per_chunk() {
    let steps = Arc::new(AtomicUsize::new(0));
    let pipeline = ChunkPipeline::new();
    pipeline.register_strategy(
        "line_steps",
        StrategyMetadata::new("One line per step", 0.0),
        Arc::new(LineSteps {
            steps: steps.clone(),
        }),
    );
    let content = RefinedContent::new("alpha line\nbeta line\ngamma line\ndelta line");
    let options = ChunkingOptions::new(StrategyName::parse("line_steps"));

    let mut stream = Box::pin(pipeline.chunk_stream(&content, &options, CancellationFlag::new()));
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.content, "alpha line");
    assert_eq!(steps.load(Ordering::SeqCst), 1);

    let mut streamed = vec![first];
    while let Some(chunk) = stream.next().await {
        streamed.push(chunk.unwrap());
    }
    assert_eq!(steps.load(Ordering::SeqCst), 4);
    assert_eq!(streamed, pipeline.chunk(&content, &options).await.unwrap());
}

#[tokio::test]
async fn test_stream_applies_importance_threshold_like_batch() {
    let text = "# Overview\n\nplain words here and there.\n\nanother loose paragraph of words.\n\n# Details\n\nmore plain words follow here.";
    let content = RefinedContent::new(text);
    let pipeline = ChunkPipeline::new();

    for threshold in [0.0, 0.7, 1.0] {
        let options = ChunkingOptions::new(StrategyName::Intelligent)
            .with_sizes(8, 1, 0)
            .with_importance_threshold(threshold);
        let batch = pipeline.chunk_blocking(&content, &options).unwrap();
        let streamed: Vec<_> = pipeline
            .chunk_stream(&content, &options, CancellationFlag::new())
            .map(Result::unwrap)
            .collect()
            .await;
        assert!(!streamed.is_empty());
        assert_eq!(streamed, batch, "threshold {threshold}");
    }
}

#[tokio::test]
async fn test_custom_strategy_by_name_and_by_auto() {
    let pipeline = ChunkPipeline::new();
    pipeline.register_strategy(
        "per_line",
        StrategyMetadata::new("One chunk per line", 2.0).with_document_types(&["plain_text"]),
        Arc::new(PerLine),
    );
    let content = RefinedContent::new("first line\nsecond line\nthird line");

    let named = pipeline
        .chunk(&content, &ChunkingOptions::new(StrategyName::parse("per_line")))
        .await
        .unwrap();
    assert_eq!(named.len(), 3);
    assert_eq!(named[1].content, "second line");
    assert_eq!(named[1].strategy_used, "per_line");

    let auto = pipeline
        .chunk(&content, &ChunkingOptions::default())
        .await
        .unwrap();
    let selection = auto[0].metadata.selection.as_ref().unwrap();
    assert_eq!(selection.strategy, "per_line");
    assert_eq!(selection.source, SelectionSource::Rules);
}

#[tokio::test]
async fn test_broken_custom_strategy_falls_back_to_fixed() {
    let pipeline = ChunkPipeline::new();
    pipeline.register_strategy(
        "out_of_bounds",
        StrategyMetadata::new("Broken", 0.0),
        Arc::new(OutOfBounds),
    );
    let options = ChunkingOptions::new(StrategyName::parse("out_of_bounds")).with_sizes(20, 1, 0);

    let chunks = pipeline
        .chunk(&RefinedContent::new(ENGLISH_PROSE), &options)
        .await
        .unwrap();
    assert!(chunks.len() > 1);
    assert!(chunks
        .iter()
        .all(|c| c.metadata.warnings.iter().any(|w| w.contains("fixed-size"))));
    assert!(chunks.iter().all(|c| c.estimated_tokens <= 20));
}

#[test]
fn test_importance_threshold_filters_and_reindexes() {
    let text = "# Overview\n\nplain words here and there.\n\nanother loose paragraph of words.\n\n# Details\n\nmore plain words follow here.";
    let options = ChunkingOptions::new(StrategyName::Intelligent)
        .with_sizes(8, 1, 0)
        .with_importance_threshold(0.7);

    let chunks = ChunkPipeline::new()
        .chunk_blocking(&RefinedContent::new(text), &options)
        .unwrap();
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| c.importance >= 0.7));
    assert!(chunks[1].content.starts_with("# Details"));
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.index, i);
    }
}

#[test]
fn test_section_path_and_pages() {
    let text = "Intro text here.\n\nMethods are described. Results follow.";
    let methods_start = text.find("Methods").unwrap_or(0);
    let content = RefinedContent::new(text)
        .with_sections(vec![Section {
            id: "s1".into(),
            title: "Paper".into(),
            section_type: "document".into(),
            level: 1,
            start_char: 0,
            end_char: text.len(),
            children: vec![Section {
                id: "s2".into(),
                title: "Methods".into(),
                section_type: "section".into(),
                level: 2,
                start_char: methods_start,
                end_char: text.len(),
                children: Vec::new(),
            }],
        }])
        .with_hint("page_breaks", json!([methods_start]));
    let options = ChunkingOptions::new(StrategyName::Paragraph).with_sizes(6, 1, 0);

    let chunks = ChunkPipeline::new()
        .chunk_blocking(&content, &options)
        .unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].location.section_path, Some(vec!["Paper".to_string()]));
    assert_eq!(chunks[0].location.start_page, Some(1));
    assert_eq!(
        chunks[1].location.section_path,
        Some(vec!["Paper".to_string(), "Methods".to_string()])
    );
    assert_eq!(chunks[1].location.start_page, Some(2));
    assert_eq!(chunks[1].location.start_char, methods_start);
}

#[test]
fn test_chunk_serializes_to_json() {
    let chunks = ChunkPipeline::new()
        .chunk_blocking(
            &RefinedContent::new(ENGLISH_PROSE),
            &ChunkingOptions::new(StrategyName::Smart),
        )
        .unwrap();
    let value = serde_json::to_value(&chunks[0]).unwrap();
    assert_eq!(value["structural_role"], json!("content"));
    assert_eq!(value["strategy_used"], json!("smart"));
    assert!(value["location"]["start_page"].is_null());
}
