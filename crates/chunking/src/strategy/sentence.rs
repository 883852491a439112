//! Sentence packing, shared by the Semantic and Smart strategies and used
//! by the others to re-split oversized blocks.

use super::{merge_undersized_tail, recover_with_fixed, Segment, SegmentContext};
use crate::budget::{estimate_tokens, trailing_overlap, Budget};
use crate::language::{split_sentences_in, Span};
use rechunk_core::ChunkError;
use std::ops::Range;

/// Penalty for a run-on sentence emitted above the flexed ceiling.
const RUN_ON_PENALTY: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PackMode {
    /// Never exceed `max`; an oversized sentence is handled per [`Oversized`].
    Strict,
    /// Let a chunk grow up to the flex ceiling instead of cutting a sentence.
    Flex,
}

/// What a strict pack does with a single sentence larger than `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Oversized {
    /// Fail the pack so the caller can pick its own fallback.
    Fail,
    /// Cut that sentence into fixed-size windows.
    FixedSplit,
}

pub(super) fn segment(cx: &SegmentContext<'_>, mode: PackMode) -> Result<Vec<Segment>, ChunkError> {
    let text = cx.text();
    let budget = cx.budget();
    let strategy = match mode {
        PackMode::Strict => "semantic",
        PackMode::Flex => "smart",
    };
    let segments = pack(cx, 0..text.len(), &budget, mode, Oversized::FixedSplit, strategy)?;
    Ok(merge_undersized_tail(segments, text, budget.min))
}

struct Sentence {
    span: Span,
    tokens: usize,
    /// A blank line precedes this sentence.
    starts_paragraph: bool,
}

/// Accumulating chunk; the first `carried` sentences repeat the previous chunk.
#[derive(Default)]
struct Open {
    sentences: Vec<usize>,
    tokens: usize,
    carried: usize,
}

impl Open {
    fn has_new_content(&self) -> bool {
        self.sentences.len() > self.carried
    }

    fn new_tokens(&self, sentences: &[Sentence]) -> usize {
        self.sentences[self.carried..]
            .iter()
            .map(|&i| sentences[i].tokens)
            .sum()
    }

    fn push(&mut self, index: usize, tokens: usize) {
        self.sentences.push(index);
        self.tokens += tokens;
    }
}

/// Pack whole sentences of `text[range]` into segments of at most
/// `budget.max` tokens (or the flex ceiling), repeating trailing sentences
/// worth up to `budget.overlap` tokens at the start of the next segment.
pub(crate) fn pack(
    cx: &SegmentContext<'_>,
    range: Range<usize>,
    budget: &Budget,
    mode: PackMode,
    oversized: Oversized,
    strategy: &str,
) -> Result<Vec<Segment>, ChunkError> {
    let text = cx.text();
    let spans = split_sentences_in(text, range, cx.profile);

    let mut previous_ends_paragraph = false;
    let sentences: Vec<Sentence> = spans
        .into_iter()
        .map(|span| {
            let body = span.as_str(text);
            let sentence = Sentence {
                span,
                tokens: estimate_tokens(body),
                starts_paragraph: previous_ends_paragraph,
            };
            previous_ends_paragraph = ends_with_blank_line(body);
            sentence
        })
        .collect();

    let ceiling = match mode {
        PackMode::Strict => budget.max,
        PackMode::Flex => budget.flex_ceiling(),
    };

    let mut out = Vec::new();
    let mut open = Open::default();

    for (i, sentence) in sentences.iter().enumerate() {
        cx.check_cancelled()?;

        if sentence.tokens > budget.max {
            close(&mut out, &open, &sentences);
            open = Open::default();
            out.extend(oversized_sentence(cx, sentence, budget, ceiling, mode, oversized, strategy)?);
            continue;
        }

        if mode == PackMode::Flex
            && sentence.starts_paragraph
            && open.has_new_content()
            && open.tokens * 4 >= budget.max * 3
        {
            open = carry_over(&mut out, open, &sentences, budget);
        }

        let fits = open.tokens + sentence.tokens <= budget.max;
        let flexes = mode == PackMode::Flex
            && open.tokens + sentence.tokens <= ceiling
            && open.new_tokens(&sentences) < budget.min;

        if !(fits || flexes) {
            open = carry_over(&mut out, open, &sentences, budget);
            if open.tokens + sentence.tokens > budget.max {
                open = Open::default();
            }
        }

        open.push(i, sentence.tokens);
    }

    close(&mut out, &open, &sentences);
    Ok(out)
}

/// Emit `open` and start the next chunk with its overlap sentences.
fn carry_over(out: &mut Vec<Segment>, open: Open, sentences: &[Sentence], budget: &Budget) -> Open {
    close(out, &open, sentences);

    let counts: Vec<usize> = open.sentences.iter().map(|&i| sentences[i].tokens).collect();
    let keep = trailing_overlap(&counts, budget.overlap);
    let carried: Vec<usize> = open.sentences[open.sentences.len() - keep..].to_vec();
    let tokens = carried.iter().map(|&i| sentences[i].tokens).sum();

    Open {
        carried: carried.len(),
        sentences: carried,
        tokens,
    }
}

fn close(out: &mut Vec<Segment>, open: &Open, sentences: &[Sentence]) {
    if !open.has_new_content() {
        return;
    }
    let (Some(&first), Some(&last)) = (open.sentences.first(), open.sentences.last()) else {
        return;
    };
    out.push(Segment::new(sentences[first].span.start..sentences[last].span.end));
}

fn oversized_sentence(
    cx: &SegmentContext<'_>,
    sentence: &Sentence,
    budget: &Budget,
    ceiling: usize,
    mode: PackMode,
    oversized: Oversized,
    strategy: &str,
) -> Result<Vec<Segment>, ChunkError> {
    let range = sentence.span.range();

    match (mode, oversized) {
        (PackMode::Flex, _) if sentence.tokens <= ceiling => Ok(vec![Segment::new(range)]),
        (PackMode::Flex, _) => {
            tracing::debug!(tokens = sentence.tokens, ceiling, "Keeping run-on sentence whole");
            Ok(vec![Segment::new(range).warn(
                format!(
                    "sentence of {} tokens exceeds the flexed ceiling of {ceiling}",
                    sentence.tokens
                ),
                RUN_ON_PENALTY,
            )])
        }
        (PackMode::Strict, Oversized::Fail) => Err(ChunkError::strategy(
            strategy,
            format!(
                "sentence of {} tokens exceeds max_chunk_size {}",
                sentence.tokens, budget.max
            ),
        )),
        (PackMode::Strict, Oversized::FixedSplit) => {
            let error = ChunkError::strategy(
                strategy,
                format!("no sentence boundary within {} tokens", budget.max),
            );
            recover_with_fixed(cx, range, budget, &error)
        }
    }
}

fn ends_with_blank_line(sentence: &str) -> bool {
    let trailing = &sentence[sentence.trim_end().len()..];
    trailing.matches('\n').count() >= 2
}
