//! Token estimation and overlap budgeting.
//!
//! Tokens are Unicode words (UAX #29). Han ideographs count one token each,
//! which keeps CJK estimates in the same order of magnitude as Latin text.

use crate::options::ChunkingOptions;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// Size limits of one strategy run, in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub max: usize,
    pub min: usize,
    pub overlap: usize,
}

impl Budget {
    pub fn from_options(options: &ChunkingOptions) -> Self {
        Self {
            max: options.max_chunk_size,
            min: options.min_chunk_size,
            overlap: options.overlap_size,
        }
    }

    /// Ceiling a sentence-preserving chunk may grow to instead of cutting a sentence.
    pub fn flex_ceiling(&self) -> usize {
        self.max + self.max.div_ceil(4)
    }
}

/// Estimated token count of `text`.
pub fn estimate_tokens(text: &str) -> usize {
    text.unicode_words().count()
}

/// Byte ranges of the tokens of `text[range]`, in absolute offsets.
pub fn token_spans(text: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let base = range.start;
    text[range]
        .unicode_word_indices()
        .map(|(offset, word)| base + offset..base + offset + word.len())
        .collect()
}

/// Sliding windows over `count` tokens, `size` wide, stepping `size - overlap`.
///
/// The final window always ends at `count`.
pub fn token_windows(count: usize, size: usize, overlap: usize) -> Vec<Range<usize>> {
    if count == 0 || size == 0 {
        return Vec::new();
    }

    let step = size.saturating_sub(overlap).max(1);
    let mut windows = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + size).min(count);
        windows.push(start..end);
        if end == count {
            break;
        }
        start += step;
    }

    windows
}

/// Byte range covered by a token window inside `range`.
///
/// Windows extend to the next token's start so consecutive windows tile
/// the text; the first starts at `range.start` and the last ends at
/// `range.end`.
pub fn window_bytes(
    tokens: &[Range<usize>],
    window: &Range<usize>,
    range: &Range<usize>,
) -> Range<usize> {
    let start = if window.start == 0 {
        range.start
    } else {
        tokens[window.start].start
    };
    let end = if window.end >= tokens.len() {
        range.end
    } else {
        tokens[window.end].start
    };
    start..end
}

/// How many trailing units, with the given token counts, fit in `budget`.
///
/// Always fewer than `units.len()` so the next chunk carries new content.
pub fn trailing_overlap(units: &[usize], budget: usize) -> usize {
    let mut used = 0;
    let mut count = 0;

    for tokens in units.iter().rev().take(units.len().saturating_sub(1)) {
        if used + tokens > budget {
            break;
        }
        used += tokens;
        count += 1;
    }

    count
}
