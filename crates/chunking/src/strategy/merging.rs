//! Segment post-processing.

use super::Segment;
use crate::budget::estimate_tokens;

/// Fold an undersized final segment into its predecessor.
///
/// Atomic segments are never merged, on either side.
pub(crate) fn merge_undersized_tail(
    mut segments: Vec<Segment>,
    text: &str,
    min_tokens: usize,
) -> Vec<Segment> {
    if segments.len() < 2 {
        return segments;
    }

    let n = segments.len();
    let last = &segments[n - 1];
    let prev = &segments[n - 2];
    if last.atomic || prev.atomic || estimate_tokens(last.text(text)) >= min_tokens {
        return segments;
    }

    let Some(last) = segments.pop() else {
        return segments;
    };
    if let Some(prev) = segments.last_mut() {
        prev.range.end = prev.range.end.max(last.range.end);
        if prev.role != last.role {
            prev.role = None;
        }
        prev.warnings.extend(last.warnings);
        prev.quality_penalty = prev.quality_penalty.max(last.quality_penalty);
    }

    segments
}

/// Remove segments holding only whitespace.
pub(crate) fn drop_blank(segments: Vec<Segment>, text: &str) -> Vec<Segment> {
    segments
        .into_iter()
        .filter(|s| !s.text(text).trim().is_empty())
        .collect()
}
