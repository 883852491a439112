//! Language profiles, script detection and sentence segmentation.
//!
//! Profiles are built once, on first access, and shared read-only for the
//! lifetime of the process.

mod profiles;
pub mod segmenter;

pub use segmenter::{find_section_starts, split_sentences, split_sentences_in, Span};

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Code of the profile used when nothing else matches.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Characters inspected by [`detect_and_get_profile`].
const DETECTION_SAMPLE_CHARS: usize = 1000;

static REGISTRY: Lazy<HashMap<&'static str, LanguageProfile>> = Lazy::new(|| {
    let map: HashMap<_, _> = profiles::builtin_profiles()
        .into_iter()
        .map(|profile| (profile.language_code, profile))
        .collect();
    tracing::debug!(languages = map.len(), "Language profiles loaded");
    map
});

static FALLBACK: Lazy<LanguageProfile> = Lazy::new(profiles::english);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritingDirection {
    LeftToRight,
    RightToLeft,
}

/// How an abbreviation interacts with a following sentence boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbbreviationKind {
    /// Precedes a name or number ("Dr.", "Mr."); never ends a sentence.
    Prepositive,
    /// Follows its head ("Inc.", "Ltd."); may legitimately end a sentence.
    Postpositive,
    /// Mid-sentence shorthand ("e.g.", "vs.").
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abbreviation {
    /// Without the trailing period
    pub text: &'static str,
    pub kind: AbbreviationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub decimal_separator: char,
    pub thousands_separator: char,
}

/// Sentence and section conventions of one language.
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    pub language_code: &'static str,
    pub name: &'static str,
    /// ISO 15924 script code
    pub script_code: &'static str,
    pub writing_direction: WritingDirection,
    pub sentence_end_pattern: Regex,
    /// Multi-line pattern matching localized section starts
    pub section_marker_pattern: Regex,
    pub abbreviations: Vec<Abbreviation>,
    pub non_breaking_prefixes: Vec<&'static str>,
    pub quotation_marks: Vec<(char, char)>,
    pub number_format: NumberFormat,
    /// "3. Oktober": a short number before a period does not end a sentence
    pub numeric_ordinals: bool,
}

impl LanguageProfile {
    /// Kind of the abbreviation spelled `token` (trailing period removed).
    ///
    /// Prepositive forms match case-sensitively; the others ignore case.
    pub fn abbreviation(&self, token: &str) -> Option<AbbreviationKind> {
        self.abbreviations
            .iter()
            .find(|a| match a.kind {
                AbbreviationKind::Prepositive => a.text == token,
                _ => a.text == token || a.text.to_lowercase() == token.to_lowercase(),
            })
            .map(|a| a.kind)
    }

    pub fn is_non_breaking_prefix(&self, token: &str) -> bool {
        self.non_breaking_prefixes.iter().any(|p| *p == token)
    }

    /// Whether words of this script are separated by spaces and carry case.
    pub fn is_cased_script(&self) -> bool {
        matches!(self.script_code, "Latn" | "Cyrl")
    }

    /// Digits plus this profile's separators only.
    pub fn is_numeric_token(&self, token: &str) -> bool {
        !token.is_empty()
            && token.chars().any(|c| c.is_ascii_digit())
            && token.chars().all(|c| {
                c.is_ascii_digit()
                    || c == self.number_format.decimal_separator
                    || c == self.number_format.thousands_separator
            })
    }

    pub fn is_opening_quote(&self, c: char) -> bool {
        self.quotation_marks.iter().any(|(open, _)| *open == c)
    }

    pub fn is_closing_quote(&self, c: char) -> bool {
        self.quotation_marks.iter().any(|(_, close)| *close == c)
    }
}

/// All built-in profiles keyed by language code.
pub fn registry() -> &'static HashMap<&'static str, LanguageProfile> {
    &REGISTRY
}

/// Supported language codes, sorted.
pub fn supported_languages() -> Vec<&'static str> {
    let mut codes: Vec<_> = registry().keys().copied().collect();
    codes.sort_unstable();
    codes
}

/// Profile for `code`.
///
/// Tries the exact code, then its base language ("pt-BR" -> "pt"), then
/// falls back to English. Never fails.
pub fn get_profile(code: &str) -> &'static LanguageProfile {
    let profiles = registry();
    let normalized = code.trim().to_lowercase();

    if let Some(profile) = profiles.get(normalized.as_str()) {
        return profile;
    }

    let base = normalized
        .split(['-', '_'])
        .next()
        .unwrap_or_default();
    if let Some(profile) = profiles.get(base) {
        return profile;
    }

    tracing::debug!(code, "Unknown language code, using English profile");
    fallback_profile()
}

fn fallback_profile() -> &'static LanguageProfile {
    registry()
        .get(FALLBACK_LANGUAGE)
        .unwrap_or_else(|| &*FALLBACK)
}

/// Writing systems distinguished by detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Latin,
    Hangul,
    Han,
    Kana,
    Arabic,
    Devanagari,
    Cyrillic,
    Other,
}

impl Script {
    pub fn of(c: char) -> Script {
        match c as u32 {
            0x0041..=0x024F | 0x1E00..=0x1EFF => Script::Latin,
            0x1100..=0x11FF | 0x3130..=0x318F | 0xAC00..=0xD7AF => Script::Hangul,
            0x3040..=0x309F | 0x30A0..=0x30FF | 0x31F0..=0x31FF | 0xFF66..=0xFF9F => {
                Script::Kana
            }
            0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF | 0x20000..=0x2A6DF => {
                Script::Han
            }
            0x0600..=0x06FF | 0x0750..=0x077F | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF => {
                Script::Arabic
            }
            0x0900..=0x097F => Script::Devanagari,
            0x0400..=0x04FF | 0x0500..=0x052F => Script::Cyrillic,
            _ => Script::Other,
        }
    }
}

/// Ratio of each script among the letters of `sample`.
pub fn script_ratios(sample: &str) -> HashMap<Script, f32> {
    let mut counts: HashMap<Script, usize> = HashMap::new();
    let mut letters = 0usize;

    for c in sample.chars().filter(|c| c.is_alphabetic()) {
        letters += 1;
        *counts.entry(Script::of(c)).or_default() += 1;
    }

    if letters == 0 {
        return HashMap::new();
    }

    counts
        .into_iter()
        .map(|(script, n)| (script, n as f32 / letters as f32))
        .collect()
}

/// Detect the dominant script of the text's first characters and return
/// the matching profile. English when nothing dominates.
pub fn detect_and_get_profile(text: &str) -> &'static LanguageProfile {
    let sample: String = text.chars().take(DETECTION_SAMPLE_CHARS).collect();
    let ratios = script_ratios(&sample);
    let ratio = |script| ratios.get(&script).copied().unwrap_or(0.0);

    // Japanese mixes kana with Han; any real share of kana decides it.
    if ratio(Script::Kana) >= 0.1 {
        return get_profile("ja");
    }

    let candidates = [
        (Script::Hangul, "ko"),
        (Script::Han, "zh"),
        (Script::Arabic, "ar"),
        (Script::Devanagari, "hi"),
        (Script::Cyrillic, "ru"),
    ];

    let dominant = candidates
        .iter()
        .map(|(script, code)| (ratio(*script), *code))
        .filter(|(r, _)| *r >= 0.2)
        .max_by(|a, b| a.0.total_cmp(&b.0));

    match dominant {
        Some((_, code)) => get_profile(code),
        None => fallback_profile(),
    }
}
