//! Input and output records of the chunking core.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cleaned document text plus structural hints, produced upstream by the
/// reader/refiner stage. Never mutated by the chunking core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefinedContent {
    pub text: String,

    /// Free-form hints such as `language`, `has_headers`, `code_spans`,
    /// `table_spans` and `page_breaks`.
    #[serde(default)]
    pub hints: HashMap<String, serde_json::Value>,

    /// Optional section hierarchy with character ranges.
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl RefinedContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_hint(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.hints.insert(key.into(), value);
        self
    }

    pub fn with_sections(mut self, sections: Vec<Section>) -> Self {
        self.sections = sections;
        self
    }

    /// String-valued hint.
    pub fn hint_str(&self, key: &str) -> Option<&str> {
        self.hints.get(key).and_then(|v| v.as_str())
    }

    /// Boolean-valued hint.
    pub fn hint_bool(&self, key: &str) -> Option<bool> {
        self.hints.get(key).and_then(|v| v.as_bool())
    }

    /// Hint holding `[[start_char, end_char], ...]`. Malformed entries are skipped.
    pub fn hint_char_spans(&self, key: &str) -> Vec<(usize, usize)> {
        let Some(items) = self.hints.get(key).and_then(|v| v.as_array()) else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| {
                let pair = item.as_array()?;
                let start = pair.first()?.as_u64()? as usize;
                let end = pair.get(1)?.as_u64()? as usize;
                (start < end).then_some((start, end))
            })
            .collect()
    }

    /// Hint holding a flat list of character offsets, sorted ascending.
    pub fn hint_offsets(&self, key: &str) -> Vec<usize> {
        let mut offsets: Vec<usize> = self
            .hints
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_u64().map(|n| n as usize))
                    .collect()
            })
            .unwrap_or_default();
        offsets.sort_unstable();
        offsets
    }
}

/// A node of the upstream section hierarchy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default, rename = "type")]
    pub section_type: String,
    #[serde(default)]
    pub level: u8,
    pub start_char: usize,
    pub end_char: usize,
    #[serde(default)]
    pub children: Vec<Section>,
}

impl Section {
    /// Titles from the outermost to the innermost section containing `char_pos`.
    pub fn path_to(sections: &[Section], char_pos: usize) -> Vec<String> {
        let mut path = Vec::new();
        let mut level = sections;

        while let Some(section) = level
            .iter()
            .find(|s| s.start_char <= char_pos && char_pos < s.end_char)
        {
            path.push(section.title.clone());
            level = &section.children;
        }

        path
    }
}

/// Structural classification of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralRole {
    Header,
    Table,
    CodeBlock,
    List,
    Content,
}

impl StructuralRole {
    /// Tables, code and lists are kept whole by structure-aware strategies.
    pub fn is_atomic(self) -> bool {
        matches!(
            self,
            StructuralRole::Table | StructuralRole::CodeBlock | StructuralRole::List
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StructuralRole::Header => "header",
            StructuralRole::Table => "table",
            StructuralRole::CodeBlock => "code_block",
            StructuralRole::List => "list",
            StructuralRole::Content => "content",
        }
    }
}

/// Coarse subject-matter classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentDomain {
    Technical,
    Business,
    Academic,
    General,
}

impl DocumentDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentDomain::Technical => "technical",
            DocumentDomain::Business => "business",
            DocumentDomain::Academic => "academic",
            DocumentDomain::General => "general",
        }
    }
}

/// Where a chunk came from in the source text. Offsets are in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkLocation {
    pub start_char: usize,
    pub end_char: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_path: Option<Vec<String>>,
}

/// How the strategy of an Auto pass was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    /// Rule-based ranking alone
    Rules,
    /// Completion service answer above the confidence threshold
    Completion,
    /// Deterministic fallback after a selection failure
    Fallback,
}

/// Outcome of automatic strategy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    pub strategy: String,
    pub confidence: f32,
    pub reasoning: String,
    pub source: SelectionSource,
}

/// Observability metadata attached to every chunk.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Language profile used for segmentation
    pub language_code: String,

    /// Present when the pass ran with the Auto strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionOutcome>,

    /// Recovered failures affecting this chunk
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// A retrieval-ready text fragment. Created once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub index: usize,
    pub content: String,
    pub location: ChunkLocation,
    pub quality: f32,
    pub importance: f32,
    pub density: f32,
    pub strategy_used: String,
    pub estimated_tokens: u32,
    pub structural_role: StructuralRole,
    pub document_domain: DocumentDomain,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contextual_header: Option<String>,
    #[serde(default)]
    pub technical_keywords: Vec<String>,
    pub metadata: ChunkMetadata,
}
