//! Fixed-size token windows.

use super::{merge_undersized_tail, Segment, SegmentContext};
use crate::budget::{token_spans, token_windows, window_bytes, Budget};
use crate::cancel::CancellationFlag;
use rechunk_core::ChunkError;
use std::ops::Range;

pub(super) fn segment(cx: &SegmentContext<'_>) -> Result<Vec<Segment>, ChunkError> {
    let text = cx.text();
    let budget = cx.budget();
    let segments = fixed_windows(text, 0..text.len(), &budget, true, cx.cancel)?;
    Ok(merge_undersized_tail(segments, text, budget.min))
}

/// Windows of `budget.max` tokens over `text[range]`, consecutive windows
/// sharing `budget.overlap` tokens.
///
/// With `merge_tail`, a final window shorter than `budget.min` tokens is
/// folded into the one before it.
pub(crate) fn fixed_windows(
    text: &str,
    range: Range<usize>,
    budget: &Budget,
    merge_tail: bool,
    cancel: &CancellationFlag,
) -> Result<Vec<Segment>, ChunkError> {
    let tokens = token_spans(text, range.clone());
    if tokens.is_empty() {
        return Ok(if text[range.clone()].trim().is_empty() {
            Vec::new()
        } else {
            vec![Segment::new(range)]
        });
    }

    let mut windows = token_windows(tokens.len(), budget.max, budget.overlap);
    if merge_tail && windows.len() > 1 {
        let short_tail = windows.last().is_some_and(|w| w.len() < budget.min);
        if short_tail {
            windows.pop();
            if let Some(last) = windows.last_mut() {
                last.end = tokens.len();
            }
        }
    }

    windows
        .iter()
        .map(|window| {
            cancel.check()?;
            Ok(Segment::new(window_bytes(&tokens, window, &range)))
        })
        .collect()
}
