//! Structural role and document domain detection.

use crate::types::{DocumentDomain, StructuralRole};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// Hits needed before a domain is claimed.
const DOMAIN_MIN_HITS: usize = 2;

/// "1.2 Overview", "2.3.1. Limits"
static NUMBERED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)+\.?[ \t]+\S").expect("heading pattern must compile"));

/// "3 Results" without trailing punctuation
static BARE_NUMBERED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[ \t]+\p{Lu}").expect("heading pattern must compile"));

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-*+•‣◦][ \t]+|\d+[.)][ \t]+|[a-zA-Z][.)][ \t]+)").expect("list pattern must compile")
});

static TABLE_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|?[ \t]*:?-{3,}:?[ \t]*(?:\|[ \t]*:?-{3,}:?[ \t]*)*\|?$")
        .expect("table pattern must compile")
});

pub const DEFAULT_TECHNICAL_KEYWORDS: &[&str] = &[
    "api", "algorithm", "async", "backend", "cache", "class", "cli", "client", "compile",
    "compiler", "config", "configuration", "container", "database", "debug", "deploy",
    "deployment", "docker", "endpoint", "enum", "frontend", "function", "git", "http", "json",
    "kernel", "kubernetes", "latency", "library", "method", "module", "protocol", "query",
    "runtime", "schema", "sdk", "server", "sql", "struct", "thread", "trait", "variable",
    // architecture vocabulary
    "architecture", "microservice", "microservices", "infrastructure", "pipeline",
    "distributed", "scalability", "component", "middleware",
    // non-Latin
    "함수", "서버", "데이터베이스", "아키텍처", "関数", "サーバー", "データベース",
    "函数", "服务器", "数据库", "接口", "架构",
];

const BUSINESS_KEYWORDS: &[&str] = &[
    "business", "strategy", "market", "revenue", "customer", "customers", "stakeholder",
    "stakeholders", "requirement", "requirements", "budget", "sales", "roi", "profit", "kpi",
    "quarter", "growth", "investment", "proposal", "management", "pricing",
    "전략", "매출", "고객", "요구사항", "市场", "战略", "客户", "売上", "戦略", "顧客",
];

const ACADEMIC_KEYWORDS: &[&str] = &[
    "research", "abstract", "methodology", "hypothesis", "study", "experiment", "experiments",
    "conclusion", "literature", "citation", "theorem", "proof", "journal", "findings",
    "연구", "논문", "초록", "방법론", "研究", "论文", "摘要", "方法论", "論文", "仮説",
];

/// Heading level of `line`, if it is a heading.
pub fn heading_level(line: &str) -> Option<u8> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) {
        let rest = &trimmed[hashes..];
        if rest.starts_with([' ', '\t']) && !rest.trim().is_empty() {
            return Some(hashes as u8);
        }
    }

    if NUMBERED_HEADING.is_match(trimmed) {
        let numbering = trimmed.split_whitespace().next().unwrap_or_default();
        let depth = numbering.trim_end_matches('.').split('.').count();
        return Some(depth.min(6) as u8);
    }

    let ends_like_sentence = trimmed.ends_with(['.', '!', '?', ':', ';', ',']);
    if BARE_NUMBERED_HEADING.is_match(trimmed)
        && !ends_like_sentence
        && trimmed.split_whitespace().count() <= 10
    {
        return Some(1);
    }

    None
}

/// Heading text without its markup or numbering.
pub fn heading_title(line: &str) -> String {
    let trimmed = line.trim().trim_start_matches('#').trim();
    let without_number = match trimmed.split_once(char::is_whitespace) {
        Some((first, rest))
            if first.chars().next().is_some_and(|c| c.is_ascii_digit())
                && first.chars().all(|c| c.is_ascii_digit() || c == '.') =>
        {
            rest.trim()
        }
        _ => trimmed,
    };
    without_number.trim_end_matches('#').trim().to_string()
}

pub fn is_table_line(line: &str) -> bool {
    let trimmed = line.trim();
    (trimmed.starts_with('|') && trimmed.matches('|').count() >= 2)
        || (trimmed.contains('|') && TABLE_SEPARATOR.is_match(trimmed))
}

pub fn is_code_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

pub fn is_list_item(line: &str) -> bool {
    LIST_ITEM.is_match(line.trim_start())
}

/// Classify a span from its first non-blank line.
///
/// Checks run in a fixed order (header, table, code, list) and the first
/// match wins.
pub fn detect_structural_role(span: &str) -> StructuralRole {
    let Some(line) = span.lines().find(|l| !l.trim().is_empty()) else {
        return StructuralRole::Content;
    };

    if heading_level(line).is_some() {
        StructuralRole::Header
    } else if is_table_line(line) {
        StructuralRole::Table
    } else if is_code_fence(line) || line.trim_start().starts_with('`') {
        StructuralRole::CodeBlock
    } else if is_list_item(line) {
        StructuralRole::List
    } else {
        StructuralRole::Content
    }
}

/// Case-insensitive occurrences of each keyword.
///
/// ASCII keywords match whole words; others match as substrings since CJK
/// text has no word separators.
fn keyword_counts<'k>(text: &str, keywords: &[&'k str]) -> HashMap<&'k str, usize> {
    let mut words: HashMap<String, usize> = HashMap::new();
    for word in text.unicode_words() {
        *words.entry(word.to_lowercase()).or_default() += 1;
    }

    keywords
        .iter()
        .filter_map(|keyword| {
            let count = if keyword.is_ascii() {
                words.get(&keyword.to_lowercase()).copied().unwrap_or(0)
            } else {
                text.matches(keyword).count()
            };
            (count > 0).then_some((*keyword, count))
        })
        .collect()
}

/// Total keyword hits in `text`.
pub fn count_keyword_hits(text: &str, keywords: &[&str]) -> usize {
    keyword_counts(text, keywords).values().sum()
}

/// Classify the subject matter of `text`.
///
/// Technical wins as soon as it reaches the threshold; otherwise the
/// stronger of business and academic, business on a tie.
pub fn detect_document_domain(text: &str, technical_keywords: &[&str]) -> DocumentDomain {
    let technical = count_keyword_hits(text, technical_keywords);
    if technical >= DOMAIN_MIN_HITS {
        return DocumentDomain::Technical;
    }

    let business = count_keyword_hits(text, BUSINESS_KEYWORDS);
    let academic = count_keyword_hits(text, ACADEMIC_KEYWORDS);

    if business >= DOMAIN_MIN_HITS && business >= academic {
        DocumentDomain::Business
    } else if academic >= DOMAIN_MIN_HITS {
        DocumentDomain::Academic
    } else {
        DocumentDomain::General
    }
}

/// Keywords present in `text`, most frequent first, at most `limit`.
pub fn extract_technical_keywords(text: &str, keywords: &[&str], limit: usize) -> Vec<String> {
    let mut found: Vec<(&str, usize)> = keyword_counts(text, keywords).into_iter().collect();
    found.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    found
        .into_iter()
        .take(limit)
        .map(|(keyword, _)| keyword.to_string())
        .collect()
}
