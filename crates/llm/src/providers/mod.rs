//! Completion provider implementations.

pub mod ollama;

pub use ollama::OllamaService;
