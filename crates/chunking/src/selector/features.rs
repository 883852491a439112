//! Cheap document features used to rank strategies.

use crate::budget::estimate_tokens;
use crate::classify::{
    detect_document_domain, heading_level, is_code_fence, is_list_item, is_table_line,
    DEFAULT_TECHNICAL_KEYWORDS,
};
use crate::language::{find_section_starts, split_sentences, LanguageProfile};
use crate::language::segmenter::paragraph_ranges;
use crate::types::{DocumentDomain, RefinedContent};
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

/// Tokens of the leading sample analysed for selection.
pub const SAMPLE_TOKENS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentFeatures {
    pub language_code: String,
    pub domain: DocumentDomain,
    pub has_headers: bool,
    pub has_markdown_headers: bool,
    pub has_code: bool,
    pub has_tables: bool,
    pub has_lists: bool,
    pub paragraph_count: usize,
    pub avg_sentence_tokens: f32,
    pub sample_tokens: usize,
    pub total_tokens: usize,
}

impl DocumentFeatures {
    pub fn extract(content: &RefinedContent, profile: &LanguageProfile) -> Self {
        let text = content.text.as_str();
        let sample_end = text
            .unicode_word_indices()
            .nth(SAMPLE_TOKENS)
            .map_or(text.len(), |(start, _)| start);
        let sample = &text[..sample_end];

        let mut markdown_headers = 0usize;
        let mut headings = 0usize;
        let mut fences = 0usize;
        let mut table_lines = 0usize;
        let mut list_items = 0usize;
        for line in sample.lines() {
            if heading_level(line).is_some() {
                headings += 1;
                if line.trim_start().starts_with('#') {
                    markdown_headers += 1;
                }
            }
            if is_code_fence(line) {
                fences += 1;
            }
            if is_table_line(line) {
                table_lines += 1;
            }
            if is_list_item(line) {
                list_items += 1;
            }
        }
        headings += find_section_starts(sample, profile)
            .iter()
            .filter(|&&start| heading_level(&sample[start..]).is_none())
            .count();

        let has_headers = content.hint_bool("has_headers").unwrap_or(false)
            || headings > 0
            || !content.sections.is_empty();
        let has_code = fences > 0 || !content.hint_char_spans("code_spans").is_empty();
        let has_tables = table_lines >= 2 || !content.hint_char_spans("table_spans").is_empty();

        let sentences = split_sentences(sample, profile);
        let sample_tokens = estimate_tokens(sample);
        let avg_sentence_tokens = if sentences.is_empty() {
            0.0
        } else {
            sample_tokens as f32 / sentences.len() as f32
        };

        Self {
            language_code: profile.language_code.to_string(),
            domain: detect_document_domain(sample, DEFAULT_TECHNICAL_KEYWORDS),
            has_headers,
            has_markdown_headers: markdown_headers > 0,
            has_code,
            has_tables,
            has_lists: list_items >= 2,
            paragraph_count: paragraph_ranges(sample, 0..sample.len()).len(),
            avg_sentence_tokens,
            sample_tokens,
            total_tokens: estimate_tokens(text),
        }
    }

    /// Tags matched against `optimal_for_document_types`.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags = vec![self.domain.as_str()];

        if self.has_headers {
            tags.push("structured");
        }
        if self.has_markdown_headers {
            tags.push("markdown");
        }
        if self.has_code {
            tags.push("code");
        }
        if self.has_tables {
            tags.push("tables");
        }

        let structured = self.has_headers || self.has_code || self.has_tables || self.has_lists;
        if !structured {
            if self.paragraph_count >= 2 {
                tags.push("narrative");
            } else {
                tags.push("plain_text");
                tags.push("unstructured");
            }
        } else if !self.has_code && !self.has_tables && self.paragraph_count >= 2 {
            tags.push("mixed");
        }

        if self.language_code != "en" {
            tags.push("multilingual");
        }

        tags
    }
}
