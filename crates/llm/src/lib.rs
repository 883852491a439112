//! Optional completion service for rechunk.
//!
//! The chunking core can consult a language model when it picks a chunking
//! strategy automatically. That capability is injected, never required:
//! every caller must cope with `None`.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use rechunk_llm::{CompletionRequest, CompletionService, OllamaService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = OllamaService::new("llama3.2");
//! let request = CompletionRequest::new("Say hi", service.default_model());
//! let response = service.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{CompletionRequest, CompletionResponse, CompletionService, CompletionUsage};
pub use factory::{create_service, from_config};
pub use providers::OllamaService;
