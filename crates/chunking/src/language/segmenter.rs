//! Sentence segmentation driven by a [`LanguageProfile`].
//!
//! Returned spans tile the input: each span ends where the next begins and
//! carries its trailing whitespace, so no character is ever dropped.

use super::{AbbreviationKind, LanguageProfile};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Blank lines always separate sentences, punctuated or not.
static BLANK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n[ \t]*(?:\r?\n[ \t]*)+").expect("blank line pattern must compile")
});

/// Byte span of one sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn as_str<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Split `text` into sentence spans. Whitespace-only input yields no spans.
pub fn split_sentences(text: &str, profile: &LanguageProfile) -> Vec<Span> {
    split_sentences_in(text, 0..text.len(), profile)
}

/// Split `text[range]` into sentence spans with absolute offsets.
pub fn split_sentences_in(
    text: &str,
    range: Range<usize>,
    profile: &LanguageProfile,
) -> Vec<Span> {
    if text[range.clone()].trim().is_empty() {
        return Vec::new();
    }

    let mut spans = Vec::new();
    for block in paragraph_ranges(text, range.clone()) {
        split_block(text, block, profile, &mut spans);
    }

    // Whitespace between blocks belongs to the sentence before it.
    if let Some(first) = spans.first_mut() {
        first.start = range.start;
    }
    if let Some(last) = spans.last_mut() {
        last.end = range.end;
    }

    spans
}

/// Blank-line delimited paragraphs of `text[range]`.
///
/// Each paragraph keeps its trailing separator, so the ranges tile `range`.
pub(crate) fn paragraph_ranges(text: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let base = range.start;
    let mut blocks = Vec::new();
    let mut start = range.start;

    for m in BLANK_LINE.find_iter(&text[range.clone()]) {
        let end = base + m.end();
        if !text[start..base + m.start()].trim().is_empty() {
            blocks.push(start..end);
            start = end;
        }
    }
    if start < range.end {
        if text[start..range.end].trim().is_empty() {
            if let Some(last) = blocks.last_mut() {
                last.end = range.end;
            }
        } else {
            blocks.push(start..range.end);
        }
    }

    blocks
}

fn split_block(text: &str, block: Range<usize>, profile: &LanguageProfile, out: &mut Vec<Span>) {
    let base = block.start;
    let slice = &text[block.clone()];
    let mut start = 0;

    for m in profile.sentence_end_pattern.find_iter(slice) {
        if m.end() <= start || slice[start..m.start()].trim().is_empty() {
            continue;
        }
        if suppresses_boundary(slice, m.start(), m.end(), profile) {
            continue;
        }
        out.push(Span {
            start: base + start,
            end: base + m.end(),
        });
        start = m.end();
    }

    if start < slice.len() {
        if slice[start..].trim().is_empty() {
            match out.last_mut() {
                Some(last) if last.end == base + start => last.end = block.end,
                _ => out.push(Span {
                    start: base + start,
                    end: block.end,
                }),
            }
        } else {
            out.push(Span {
                start: base + start,
                end: block.end,
            });
        }
    }
}

/// Whether the terminator matched at `slice[m_start..m_end]` is not a real
/// sentence end.
fn suppresses_boundary(
    slice: &str,
    m_start: usize,
    m_end: usize,
    profile: &LanguageProfile,
) -> bool {
    let terminator = slice[m_start..m_end].trim_start();
    // Only a single period can be an abbreviation; "!", "?", "..." always end.
    if !terminator.starts_with('.') || terminator.starts_with("..") {
        return false;
    }

    let token = preceding_token(&slice[..m_start], profile);
    if token.is_empty() {
        return false;
    }

    let next = slice[m_end..].chars().next();
    let continues_lowercase = next.is_some_and(|c| c.is_lowercase() || c.is_numeric());

    if profile.is_non_breaking_prefix(token) {
        return true;
    }

    match profile.abbreviation(token) {
        Some(AbbreviationKind::Prepositive | AbbreviationKind::General) => return true,
        Some(AbbreviationKind::Postpositive) => return continues_lowercase,
        None => {}
    }

    if profile.is_cased_script() {
        let mut chars = token.chars();
        // Initials: "J. R. Tolkien"
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_uppercase() {
                return true;
            }
        }
        if continues_lowercase {
            return true;
        }
    }

    if profile.numeric_ordinals && token.len() <= 3 && token.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    false
}

/// Word immediately before a terminator, stripped of quotes and the
/// abbreviation's own internal trailing periods.
fn preceding_token<'a>(before: &'a str, profile: &LanguageProfile) -> &'a str {
    let word = before
        .trim_end()
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default();

    word.trim_start_matches(|c: char| {
        profile.is_opening_quote(c) || matches!(c, '(' | '[' | '"' | '\'')
    })
    .trim_end_matches('.')
}

/// Byte offsets where localized section markers start a line.
pub fn find_section_starts(text: &str, profile: &LanguageProfile) -> Vec<usize> {
    profile
        .section_marker_pattern
        .find_iter(text)
        .map(|m| {
            // Report the start of the marker line, not of its indentation.
            let indent = text[m.start()..m.end()]
                .len()
                .saturating_sub(text[m.start()..m.end()].trim_start().len());
            m.start() + indent
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::get_profile;

    fn sentences<'a>(text: &'a str, code: &str) -> Vec<&'a str> {
        split_sentences(text, get_profile(code))
            .iter()
            .map(|s| s.as_str(text).trim())
            .collect()
    }

    #[test]
    fn test_abbreviation_and_time_suffix() {
        let text = "Dr. Smith arrived at 5 p.m. He was late.";
        assert_eq!(
            sentences(text, "en"),
            vec!["Dr. Smith arrived at 5 p.m.", "He was late."]
        );
    }

    #[test]
    fn test_spans_tile_input() {
        let text = "  First one. Second one!   Third?\n\nFourth without end ";
        let spans = split_sentences(text, get_profile("en"));
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans.last().map(|s| s.end), Some(text.len()));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_postpositive_before_lowercase() {
        let text = "Acme Inc. announced a merger. Widgets Ltd. Then more news.";
        assert_eq!(
            sentences(text, "en"),
            vec!["Acme Inc. announced a merger.", "Widgets Ltd.", "Then more news."]
        );
    }

    #[test]
    fn test_initials_and_examples() {
        let text = "Written by J. R. Tolkien. Use tools, e.g. Cargo. Done.";
        assert_eq!(
            sentences(text, "en"),
            vec!["Written by J. R. Tolkien.", "Use tools, e.g. Cargo.", "Done."]
        );
    }

    #[test]
    fn test_blank_line_is_boundary() {
        let text = "# Heading\n\nBody text here.";
        assert_eq!(sentences(text, "en"), vec!["# Heading", "Body text here."]);
    }

    #[test]
    fn test_korean_endings() {
        let text = "회의는 오전에 시작합니다 참석자는 모두 도착했어요. 감사합니다";
        assert_eq!(
            sentences(text, "ko"),
            vec!["회의는 오전에 시작합니다", "참석자는 모두 도착했어요.", "감사합니다"]
        );
    }

    #[test]
    fn test_cjk_full_width_stops() {
        let text = "今天天气很好。我们去公园吧！好的";
        assert_eq!(sentences(text, "zh"), vec!["今天天气很好。", "我们去公园吧！", "好的"]);

        let text = "「こんにちは。」と彼は言った。";
        assert_eq!(sentences(text, "ja"), vec!["「こんにちは。」", "と彼は言った。"]);
    }

    #[test]
    fn test_hindi_danda() {
        let text = "यह पहला वाक्य है। यह दूसरा है।";
        assert_eq!(sentences(text, "hi").len(), 2);
    }

    #[test]
    fn test_french_spaced_punctuation() {
        let text = "Bonjour ! Comment allez-vous ? M. Dupont est là.";
        assert_eq!(
            sentences(text, "fr"),
            vec!["Bonjour !", "Comment allez-vous ?", "M. Dupont est là."]
        );
    }

    #[test]
    fn test_german_ordinals() {
        let text = "Am 3. Oktober ist Feiertag. Das ist z.B. wichtig.";
        assert_eq!(
            sentences(text, "de"),
            vec!["Am 3. Oktober ist Feiertag.", "Das ist z.B. wichtig."]
        );
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(split_sentences("", get_profile("en")).is_empty());
        assert!(split_sentences(" \n\t ", get_profile("en")).is_empty());
        assert_eq!(sentences("no terminator", "en"), vec!["no terminator"]);
    }

    #[test]
    fn test_sub_range_offsets() {
        let text = "Skip this. Keep one. Keep two.";
        let start = text.find("Keep").unwrap_or(0);
        let spans = split_sentences_in(text, start..text.len(), get_profile("en"));
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].start, start);
        assert_eq!(spans[1].as_str(text), "Keep two.");
    }

    #[test]
    fn test_section_starts() {
        let text = "Intro\n\n  Chapter 2 Methods\nBody\n# Notes\n";
        let starts = find_section_starts(text, get_profile("en"));
        assert_eq!(starts.len(), 2);
        assert!(text[starts[0]..].starts_with("Chapter 2"));
        assert!(text[starts[1]..].starts_with("# Notes"));

        let korean = "서론\n제2장 본론\n";
        let starts = find_section_starts(korean, get_profile("ko"));
        assert_eq!(starts.len(), 1);
        assert!(korean[starts[0]..].starts_with("제2장"));
    }
}
