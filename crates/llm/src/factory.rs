//! Completion service factory.
//!
//! Resolves a provider name from configuration into a shared service
//! handle. The provider "none" is valid and means "no completion service":
//! the Auto selector then runs purely on its rule-based path.

use crate::client::CompletionService;
use crate::providers::{ollama::DEFAULT_BASE_URL, OllamaService};
use rechunk_core::config::LlmSection;
use rechunk_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a completion service based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("none", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `model` - Model identifier used for every request
///
/// # Returns
/// `Ok(None)` for the "none" provider, a shared service otherwise.
pub fn create_service(
    provider: &str,
    endpoint: Option<&str>,
    model: &str,
) -> AppResult<Option<Arc<dyn CompletionService>>> {
    match provider.to_lowercase().as_str() {
        "none" | "" => Ok(None),
        "ollama" => {
            let base_url = endpoint.unwrap_or(DEFAULT_BASE_URL);
            tracing::debug!(base_url, model, "Creating Ollama completion service");
            Ok(Some(Arc::new(OllamaService::with_base_url(base_url, model))))
        }
        other => Err(AppError::Config(format!("Unknown provider: {}", other))),
    }
}

/// Create a completion service from the `llm:` config section.
pub fn from_config(section: &LlmSection) -> AppResult<Option<Arc<dyn CompletionService>>> {
    create_service(&section.provider, section.endpoint.as_deref(), &section.model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_provider_yields_no_service() {
        let service = create_service("none", None, "llama3.2").unwrap();
        assert!(service.is_none());
    }

    #[test]
    fn test_create_ollama_service() {
        let service = create_service("Ollama", Some("http://localhost:8080"), "llama3.2")
            .unwrap()
            .unwrap();
        assert_eq!(service.provider_name(), "ollama");
        assert_eq!(service.default_model(), "llama3.2");
    }

    #[test]
    fn test_unknown_provider() {
        match create_service("unknown", None, "m") {
            Err(AppError::Config(msg)) => assert!(msg.contains("Unknown provider")),
            _ => panic!("Expected config error for unknown provider"),
        }
    }

    #[test]
    fn test_from_default_config() {
        let service = from_config(&LlmSection::default()).unwrap();
        assert!(service.is_none());
    }
}
