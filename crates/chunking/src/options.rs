//! Chunking options and strategy names.

use crate::types::DocumentDomain;
use rechunk_core::config::ChunkingSection;
use rechunk_core::ChunkError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MAX_CHUNK_SIZE: usize = 512;
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 50;
pub const DEFAULT_OVERLAP_SIZE: usize = 50;

/// Key in `strategy_options` bounding the whole Auto selection step, in seconds.
pub const MAX_ANALYSIS_TIME_KEY: &str = "max_analysis_time_seconds";

/// Name of a chunking strategy.
///
/// Built-in names parse case-insensitively; anything else is a custom
/// strategy looked up in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StrategyName {
    Auto,
    FixedSize,
    Paragraph,
    Semantic,
    Smart,
    Intelligent,
    Custom(String),
}

impl StrategyName {
    pub fn as_str(&self) -> &str {
        match self {
            StrategyName::Auto => "auto",
            StrategyName::FixedSize => "fixed_size",
            StrategyName::Paragraph => "paragraph",
            StrategyName::Semantic => "semantic",
            StrategyName::Smart => "smart",
            StrategyName::Intelligent => "intelligent",
            StrategyName::Custom(name) => name,
        }
    }

    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "auto" => StrategyName::Auto,
            "fixed" | "fixed_size" | "fixedsize" => StrategyName::FixedSize,
            "paragraph" => StrategyName::Paragraph,
            "semantic" => StrategyName::Semantic,
            "smart" => StrategyName::Smart,
            "intelligent" => StrategyName::Intelligent,
            _ => StrategyName::Custom(name.trim().to_string()),
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for StrategyName {
    fn from(value: String) -> Self {
        StrategyName::parse(&value)
    }
}

impl From<StrategyName> for String {
    fn from(value: StrategyName) -> Self {
        value.as_str().to_string()
    }
}

/// Options for one chunking pass.
///
/// `max_chunk_size`, `min_chunk_size` and `overlap_size` are in estimated
/// tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingOptions {
    pub strategy: StrategyName,
    pub max_chunk_size: usize,
    pub min_chunk_size: usize,
    pub overlap_size: usize,
    pub preserve_structure: bool,
    pub importance_threshold: f32,

    /// Strategy-specific flags such as `prefer_speed`, `prefer_quality`,
    /// `use_domain_presets` and `allow_auto_fallback`.
    #[serde(default)]
    pub strategy_options: HashMap<String, serde_json::Value>,

    /// Language overrides; `language` forces a profile.
    #[serde(default)]
    pub language_options: HashMap<String, serde_json::Value>,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            strategy: StrategyName::Auto,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            overlap_size: DEFAULT_OVERLAP_SIZE,
            preserve_structure: true,
            importance_threshold: 0.0,
            strategy_options: HashMap::new(),
            language_options: HashMap::new(),
        }
    }
}

impl ChunkingOptions {
    pub fn new(strategy: StrategyName) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Build options from the `chunking:` config section.
    pub fn from_config(section: &ChunkingSection) -> Self {
        let mut options = Self {
            strategy: StrategyName::parse(&section.strategy),
            max_chunk_size: section.max_chunk_size,
            min_chunk_size: section.min_chunk_size,
            overlap_size: section.overlap_size,
            preserve_structure: section.preserve_structure,
            importance_threshold: section.importance_threshold,
            ..Default::default()
        };
        if let Some(language) = &section.language {
            options = options.with_language(language);
        }
        options
    }

    /// Size presets tuned per document domain.
    pub fn for_domain(domain: DocumentDomain) -> Self {
        Self::default().with_domain_preset(domain)
    }

    /// Replace the size triple with the preset for `domain`, keeping everything else.
    pub fn with_domain_preset(mut self, domain: DocumentDomain) -> Self {
        let (max, min, overlap) = match domain {
            DocumentDomain::Technical => (384, 32, 64),
            DocumentDomain::Business => (512, 50, 50),
            DocumentDomain::Academic => (640, 64, 80),
            DocumentDomain::General => (512, 50, 50),
        };
        self.max_chunk_size = max;
        self.min_chunk_size = min;
        self.overlap_size = overlap;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyName) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_sizes(mut self, max: usize, min: usize, overlap: usize) -> Self {
        self.max_chunk_size = max;
        self.min_chunk_size = min;
        self.overlap_size = overlap;
        self
    }

    pub fn with_importance_threshold(mut self, threshold: f32) -> Self {
        self.importance_threshold = threshold;
        self
    }

    pub fn with_strategy_option(
        mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.strategy_options.insert(key.into(), value);
        self
    }

    pub fn with_language(mut self, code: impl Into<String>) -> Self {
        self.language_options
            .insert("language".to_string(), serde_json::Value::String(code.into()));
        self
    }

    /// Reject invalid options before any processing.
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.max_chunk_size == 0 {
            return Err(ChunkError::InvalidOptions(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.min_chunk_size > self.max_chunk_size {
            return Err(ChunkError::InvalidOptions(format!(
                "min_chunk_size ({}) exceeds max_chunk_size ({})",
                self.min_chunk_size, self.max_chunk_size
            )));
        }
        if self.overlap_size >= self.max_chunk_size {
            return Err(ChunkError::InvalidOptions(format!(
                "overlap_size ({}) must be smaller than max_chunk_size ({})",
                self.overlap_size, self.max_chunk_size
            )));
        }
        if !self.importance_threshold.is_finite() || !(0.0..=1.0).contains(&self.importance_threshold)
        {
            return Err(ChunkError::InvalidOptions(format!(
                "importance_threshold ({}) must be within [0, 1]",
                self.importance_threshold
            )));
        }
        if let Some(seconds) = self.strategy_options.get(MAX_ANALYSIS_TIME_KEY) {
            match seconds.as_f64() {
                Some(s) if s.is_finite() && s >= 0.0 => {}
                _ => {
                    return Err(ChunkError::InvalidOptions(format!(
                        "{MAX_ANALYSIS_TIME_KEY} must be a non-negative number"
                    )))
                }
            }
        }
        Ok(())
    }

    /// Boolean strategy flag, false when absent.
    pub fn flag(&self, key: &str) -> bool {
        self.strategy_options
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Language forced through `language_options`.
    pub fn language(&self) -> Option<&str> {
        self.language_options
            .get("language")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// Upper bound on Auto selection, if the caller set one.
    pub fn max_analysis_time(&self) -> Option<Duration> {
        self.strategy_options
            .get(MAX_ANALYSIS_TIME_KEY)
            .and_then(|v| v.as_f64())
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_are_valid() {
        let options = ChunkingOptions::default();
        assert_eq!(options.strategy, StrategyName::Auto);
        assert_eq!(options.max_chunk_size, 512);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_strategy_name_parsing() {
        assert_eq!(StrategyName::parse("Fixed-Size"), StrategyName::FixedSize);
        assert_eq!(StrategyName::parse("fixed"), StrategyName::FixedSize);
        assert_eq!(StrategyName::parse(" SMART "), StrategyName::Smart);
        assert_eq!(
            StrategyName::parse("legal_clauses"),
            StrategyName::Custom("legal_clauses".to_string())
        );
        assert_eq!(StrategyName::Intelligent.to_string(), "intelligent");
    }

    #[test]
    fn test_strategy_name_serde_as_string() {
        let options: ChunkingOptions = serde_json::from_value(json!({
            "strategy": "semantic",
            "max_chunk_size": 100,
            "min_chunk_size": 10,
            "overlap_size": 5,
            "preserve_structure": false,
            "importance_threshold": 0.2
        }))
        .unwrap();
        assert_eq!(options.strategy, StrategyName::Semantic);
        assert_eq!(serde_json::to_value(&options.strategy).unwrap(), json!("semantic"));
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        let cases = [
            ChunkingOptions::default().with_sizes(0, 0, 0),
            ChunkingOptions::default().with_sizes(100, 200, 10),
            ChunkingOptions::default().with_sizes(100, 10, 100),
            ChunkingOptions::default().with_importance_threshold(1.5),
            ChunkingOptions::default().with_strategy_option(MAX_ANALYSIS_TIME_KEY, json!(-1.0)),
        ];
        for options in cases {
            assert!(matches!(
                options.validate(),
                Err(ChunkError::InvalidOptions(_))
            ));
        }
    }

    #[test]
    fn test_from_config_section() {
        let section = ChunkingSection {
            strategy: "paragraph".to_string(),
            max_chunk_size: 300,
            min_chunk_size: 20,
            overlap_size: 30,
            language: Some("ko".to_string()),
            ..Default::default()
        };
        let options = ChunkingOptions::from_config(&section);
        assert_eq!(options.strategy, StrategyName::Paragraph);
        assert_eq!(options.max_chunk_size, 300);
        assert_eq!(options.language(), Some("ko"));
    }

    #[test]
    fn test_domain_preset_keeps_strategy() {
        let options = ChunkingOptions::new(StrategyName::Intelligent)
            .with_domain_preset(DocumentDomain::Technical);
        assert_eq!(options.strategy, StrategyName::Intelligent);
        assert_eq!(options.max_chunk_size, 384);
        assert!(options.validate().is_ok());
        assert!(ChunkingOptions::for_domain(DocumentDomain::Academic)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_max_analysis_time() {
        let options = ChunkingOptions::default()
            .with_strategy_option(MAX_ANALYSIS_TIME_KEY, json!(0.25))
            .with_strategy_option("prefer_speed", json!(true));
        assert_eq!(options.max_analysis_time(), Some(Duration::from_millis(250)));
        assert!(options.flag("prefer_speed"));
        assert!(!options.flag("prefer_quality"));
    }
}
