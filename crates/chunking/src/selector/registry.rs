//! Strategy registry: name -> implementation plus selection metadata.

use crate::options::StrategyName;
use crate::strategy::{BuiltinStrategy, ChunkingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// What the Auto selector knows about a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyMetadata {
    pub description: String,
    /// Feature tags this strategy suits ("technical", "narrative", ...)
    pub optimal_for_document_types: Vec<String>,
    /// "speed", "quality", "structure", ...
    pub strengths: Vec<String>,
    /// Baseline ranking score
    pub priority_score: f32,
}

impl StrategyMetadata {
    pub fn new(description: impl Into<String>, priority_score: f32) -> Self {
        Self {
            description: description.into(),
            optimal_for_document_types: Vec::new(),
            strengths: Vec::new(),
            priority_score,
        }
    }

    pub fn with_document_types(mut self, types: &[&str]) -> Self {
        self.optimal_for_document_types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_strengths(mut self, strengths: &[&str]) -> Self {
        self.strengths = strengths.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn has_strength(&self, strength: &str) -> bool {
        self.strengths.iter().any(|s| s == strength)
    }

    pub fn builtin(strategy: BuiltinStrategy) -> Self {
        match strategy {
            BuiltinStrategy::FixedSize => {
                Self::new("Fixed token windows with overlap; ignores structure", 0.4)
                    .with_document_types(&["plain_text", "unstructured", "logs"])
                    .with_strengths(&["speed", "predictable_size"])
            }
            BuiltinStrategy::Paragraph => {
                Self::new("Groups blank-line separated paragraphs up to the size limit", 0.5)
                    .with_document_types(&["narrative", "articles", "plain_text"])
                    .with_strengths(&["speed", "paragraph_integrity"])
            }
            BuiltinStrategy::Semantic => {
                Self::new("Packs whole sentences with sentence-level overlap", 0.55)
                    .with_document_types(&["narrative", "general", "articles"])
                    .with_strengths(&["sentence_integrity", "overlap_context"])
            }
            BuiltinStrategy::Smart => Self::new(
                "Sentence packing with a flexible ceiling and paragraph-aware closing",
                0.6,
            )
            .with_document_types(&["general", "narrative", "mixed", "multilingual"])
            .with_strengths(&["quality", "sentence_integrity"]),
            BuiltinStrategy::Intelligent => Self::new(
                "Structure-aware chunking keeping code, tables and lists whole under their headings",
                0.6,
            )
            .with_document_types(&["technical", "structured", "markdown", "code", "tables"])
            .with_strengths(&["quality", "structure"]),
        }
    }
}

/// Implementation behind a registered name.
#[derive(Clone)]
pub enum StrategyHandle {
    Builtin(BuiltinStrategy),
    Custom(Arc<dyn ChunkingStrategy>),
}

impl StrategyHandle {
    pub fn as_strategy(&self) -> &dyn ChunkingStrategy {
        match self {
            StrategyHandle::Builtin(strategy) => strategy,
            StrategyHandle::Custom(strategy) => strategy.as_ref(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, StrategyHandle::Builtin(_))
    }
}

impl fmt::Debug for StrategyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyHandle::Builtin(strategy) => write!(f, "Builtin({})", strategy.as_str()),
            StrategyHandle::Custom(strategy) => write!(f, "Custom({})", strategy.name()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisteredStrategy {
    pub name: String,
    pub metadata: StrategyMetadata,
    pub handle: StrategyHandle,
}

/// Thread-safe strategy registry.
///
/// Reads take a short-held read lock and return clones, so a selection
/// never holds the lock across a completion call. Registering an existing
/// name replaces it.
#[derive(Debug)]
pub struct StrategyRegistry {
    entries: RwLock<HashMap<String, RegisteredStrategy>>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Canonical registry key: built-in aliases collapse to one name.
fn registry_key(name: &str) -> String {
    StrategyName::parse(name).as_str().to_string()
}

impl StrategyRegistry {
    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        for strategy in BuiltinStrategy::ALL {
            registry.insert(RegisteredStrategy {
                name: strategy.as_str().to_string(),
                metadata: StrategyMetadata::builtin(strategy),
                handle: StrategyHandle::Builtin(strategy),
            });
        }
        registry
    }

    /// Register a custom strategy under `name`.
    pub fn register(
        &self,
        name: impl Into<String>,
        metadata: StrategyMetadata,
        strategy: Arc<dyn ChunkingStrategy>,
    ) {
        let name = registry_key(&name.into());
        tracing::debug!(strategy = %name, "Registering chunking strategy");
        self.insert(RegisteredStrategy {
            name,
            metadata,
            handle: StrategyHandle::Custom(strategy),
        });
    }

    fn insert(&self, entry: RegisteredStrategy) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.insert(entry.name.clone(), entry).is_some() {
            tracing::debug!("Replaced an existing strategy registration");
        }
    }

    pub fn get(&self, name: &str) -> Option<RegisteredStrategy> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&registry_key(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All registrations, sorted by name.
    pub fn snapshot(&self) -> Vec<RegisteredStrategy> {
        let mut all: Vec<RegisteredStrategy> = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            entries.values().cloned().collect()
        };
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
