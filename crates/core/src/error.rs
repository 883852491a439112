//! Error types for rechunk.
//!
//! Two enums live here:
//! - [`ChunkError`] is the taxonomy of the chunking core. Only
//!   `InvalidOptions` and `Cancelled` ever reach a caller of the public
//!   chunking API; the other variants are recovered inside the pipeline.
//! - [`AppError`] is the unified error for the binaries and the
//!   completion-service layer.

use thiserror::Error;

/// Errors raised by the chunking core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChunkError {
    /// Options rejected before processing starts.
    #[error("Invalid chunking options: {0}")]
    InvalidOptions(String),

    /// A strategy could not produce output for a span.
    #[error("Strategy '{strategy}' failed: {reason}")]
    StrategyFailure { strategy: String, reason: String },

    /// Auto selection could not rank or the completion call failed.
    #[error("Strategy selection failed: {0}")]
    SelectionFailure(String),

    /// The caller cancelled the pass.
    #[error("Chunking was cancelled")]
    Cancelled,
}

impl ChunkError {
    /// Shorthand for a [`ChunkError::StrategyFailure`].
    pub fn strategy(strategy: impl Into<String>, reason: impl Into<String>) -> Self {
        ChunkError::StrategyFailure {
            strategy: strategy.into(),
            reason: reason.into(),
        }
    }

    /// Whether the pipeline is allowed to recover from this error locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ChunkError::StrategyFailure { .. } | ChunkError::SelectionFailure(_)
        )
    }
}

/// Unified application error.
///
/// We never panic: everything that can fail returns `AppResult`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Completion service errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Errors from the chunking core
    #[error(transparent)]
    Chunking(#[from] ChunkError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_variants() {
        assert!(ChunkError::strategy("paragraph", "loop").is_recoverable());
        assert!(ChunkError::SelectionFailure("timeout".into()).is_recoverable());
        assert!(!ChunkError::Cancelled.is_recoverable());
        assert!(!ChunkError::InvalidOptions("min > max".into()).is_recoverable());
    }

    #[test]
    fn test_chunk_error_converts_into_app_error() {
        let err: AppError = ChunkError::Cancelled.into();
        assert!(matches!(err, AppError::Chunking(ChunkError::Cancelled)));
        assert_eq!(err.to_string(), "Chunking was cancelled");
    }

    #[test]
    fn test_strategy_failure_message() {
        let err = ChunkError::strategy("semantic", "no boundary");
        assert_eq!(err.to_string(), "Strategy 'semantic' failed: no boundary");
    }
}
