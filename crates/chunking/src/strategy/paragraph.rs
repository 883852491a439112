//! Paragraph grouping.

use super::sentence::{pack, Oversized, PackMode};
use super::{merge_undersized_tail, recover_with_fixed, Segment, SegmentContext};
use crate::budget::{estimate_tokens, Budget};
use crate::language::segmenter::paragraph_ranges;
use rechunk_core::ChunkError;
use std::ops::Range;

/// Greedily groups blank-line separated paragraphs up to `max` tokens.
/// Paragraphs never overlap.
pub(super) fn segment(cx: &SegmentContext<'_>) -> Result<Vec<Segment>, ChunkError> {
    let text = cx.text();
    let budget = Budget {
        overlap: 0,
        ..cx.budget()
    };

    let mut out = Vec::new();
    let mut open: Option<(Range<usize>, usize)> = None;

    for paragraph in paragraph_ranges(text, 0..text.len()) {
        cx.check_cancelled()?;
        let tokens = estimate_tokens(&text[paragraph.clone()]);

        if tokens > budget.max {
            if let Some((range, _)) = open.take() {
                out.push(Segment::new(range));
            }
            out.extend(split_oversized(cx, paragraph, &budget)?);
            continue;
        }

        open = match open.take() {
            Some((range, used)) if used + tokens <= budget.max => {
                Some((range.start..paragraph.end, used + tokens))
            }
            Some((range, _)) => {
                out.push(Segment::new(range));
                Some((paragraph, tokens))
            }
            None => Some((paragraph, tokens)),
        };
    }

    if let Some((range, _)) = open {
        out.push(Segment::new(range));
    }

    Ok(merge_undersized_tail(out, text, budget.min))
}

/// Sentence-split a paragraph too large for one chunk, or fall back to
/// fixed windows when a single sentence is still too large.
fn split_oversized(
    cx: &SegmentContext<'_>,
    paragraph: Range<usize>,
    budget: &Budget,
) -> Result<Vec<Segment>, ChunkError> {
    match pack(cx, paragraph.clone(), budget, PackMode::Strict, Oversized::Fail, "paragraph") {
        Ok(segments) => Ok(segments),
        Err(error) if error.is_recoverable() => recover_with_fixed(cx, paragraph, budget, &error),
        Err(error) => Err(error),
    }
}
