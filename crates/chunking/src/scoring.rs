//! Quality, importance and density scores. All scores are clamped to [0, 1].

use crate::classify::heading_level;
use crate::language::LanguageProfile;
use crate::types::StructuralRole;
use std::collections::HashSet;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

pub const BASE_IMPORTANCE: f32 = 0.5;
const HEADER_BOOST: f32 = 0.25;
const MAX_KEYWORD_BOOST: f32 = 0.25;

/// Tokens at which density stops being discounted for shortness.
const DENSITY_SATURATION_TOKENS: f32 = 20.0;

/// Weighted quality: structure 0.4, completeness 0.3, consistency 0.3.
pub fn quality(structure: f32, completeness: f32, consistency: f32, penalty: f32) -> f32 {
    (0.4 * structure + 0.3 * completeness + 0.3 * consistency - penalty).clamp(0.0, 1.0)
}

/// How cleanly a chunk starts and ends.
pub fn structure_confidence(content: &str, role: StructuralRole, profile: &LanguageProfile) -> f32 {
    if role.is_atomic() || role == StructuralRole::Header {
        return 1.0;
    }

    let starts_clean = content
        .chars()
        .next()
        .is_some_and(|c| !c.is_lowercase());
    let ends_clean = ends_at_boundary(content, profile);

    0.5 * starts_clean as u8 as f32 + 0.5 * ends_clean as u8 as f32
}

/// Whether `content` ends on a sentence terminator of `profile`.
pub fn ends_at_boundary(content: &str, profile: &LanguageProfile) -> bool {
    let trimmed = content.trim_end();
    if trimmed.is_empty() {
        return false;
    }

    let tail_start = trimmed
        .char_indices()
        .rev()
        .nth(15)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let tail = &trimmed[tail_start..];

    profile
        .sentence_end_pattern
        .find_iter(tail)
        .any(|m| m.end() == tail.len())
}

/// Fraction of the text's non-whitespace bytes covered by `ranges`.
pub fn completeness(text: &str, ranges: &[Range<usize>]) -> f32 {
    let total = text.bytes().filter(|b| !b.is_ascii_whitespace()).count();
    if total == 0 {
        return 1.0;
    }

    let mut sorted: Vec<Range<usize>> = ranges.to_vec();
    sorted.sort_by_key(|r| r.start);

    let mut covered = 0usize;
    let mut cursor = 0usize;
    for range in sorted {
        let start = range.start.max(cursor);
        if start < range.end {
            covered += text.as_bytes()[start..range.end]
                .iter()
                .filter(|b| !b.is_ascii_whitespace())
                .count();
            cursor = range.end;
        }
    }

    (covered as f32 / total as f32).clamp(0.0, 1.0)
}

/// Closeness of a chunk's size to three quarters of the ceiling.
pub fn consistency(tokens: usize, max_tokens: usize) -> f32 {
    let target = (max_tokens as f32 * 0.75).max(1.0);
    (1.0 - (tokens as f32 - target).abs() / target).clamp(0.0, 1.0)
}

/// Baseline 0.5, boosted for headings and technical keyword density.
pub fn importance(content: &str, role: StructuralRole, tokens: usize, keyword_hits: usize) -> f32 {
    let mut score = BASE_IMPORTANCE;

    let has_heading =
        role == StructuralRole::Header || content.lines().any(|l| heading_level(l).is_some());
    if has_heading {
        score += HEADER_BOOST;
    }

    if tokens > 0 {
        let density = keyword_hits as f32 / tokens as f32;
        score += (density * 2.5).min(MAX_KEYWORD_BOOST);
    }

    score.clamp(0.0, 1.0)
}

/// Unique-word ratio, discounted for very short chunks.
pub fn density(content: &str) -> f32 {
    let words: Vec<String> = content.unicode_words().map(|w| w.to_lowercase()).collect();
    if words.is_empty() {
        return 0.0;
    }

    let unique: HashSet<&String> = words.iter().collect();
    let ratio = unique.len() as f32 / words.len() as f32;
    let saturation = (words.len() as f32 / DENSITY_SATURATION_TOKENS).min(1.0);

    (ratio * saturation).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::get_profile;

    #[test]
    fn test_quality_weights_and_clamp() {
        assert!((quality(1.0, 1.0, 1.0, 0.0) - 1.0).abs() < 1e-6);
        assert!((quality(1.0, 0.0, 0.0, 0.0) - 0.4).abs() < 1e-6);
        assert_eq!(quality(0.1, 0.1, 0.1, 0.9), 0.0);
    }

    #[test]
    fn test_structure_confidence() {
        let en = get_profile("en");
        assert_eq!(structure_confidence("A full sentence.", StructuralRole::Content, en), 1.0);
        assert_eq!(structure_confidence("cut in the mid", StructuralRole::Content, en), 0.0);
        assert_eq!(structure_confidence("| a | b |", StructuralRole::Table, en), 1.0);

        let ko = get_profile("ko");
        assert_eq!(structure_confidence("회의를 시작합니다", StructuralRole::Content, ko), 1.0);
    }

    #[test]
    fn test_completeness_counts_overlap_once() {
        let text = "aaaa bbbb cccc";
        assert_eq!(completeness(text, &[0..9, 5..14]), 1.0);
        let partial = completeness(text, &[0..4]);
        assert!((partial - 4.0 / 12.0).abs() < 1e-6);
        assert_eq!(completeness("   ", &[]), 1.0);
    }

    #[test]
    fn test_importance_boosts() {
        let plain = importance("Just some words here.", StructuralRole::Content, 4, 0);
        assert_eq!(plain, BASE_IMPORTANCE);

        let header = importance("# Title\nBody", StructuralRole::Content, 2, 0);
        assert!((header - 0.75).abs() < 1e-6);

        let technical = importance("api server", StructuralRole::Content, 2, 2);
        assert!((technical - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_density() {
        assert_eq!(density(""), 0.0);
        let repeated = density(&"word ".repeat(40));
        let varied: String = (0..40).map(|i| format!("w{i} ")).collect();
        assert!(density(&varied) > repeated);
        assert!((density(&varied) - 1.0).abs() < 1e-6);
    }
}
