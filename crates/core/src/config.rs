//! Configuration management for rechunk.
//!
//! Configuration is merged from several sources, lowest precedence first:
//! - Built-in defaults
//! - Config file (`.rechunk/config.yaml` or `RECHUNK_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The chunking section only carries plain values; the chunking crate turns
//! them into validated `ChunkingOptions`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the completion-service factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["none", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .rechunk/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Default chunking settings
    pub chunking: ChunkingSection,

    /// Auto strategy selection settings
    pub selection: SelectionSection,

    /// Completion service used by the Auto selector
    pub llm: LlmSection,
}

/// `chunking:` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChunkingSection {
    pub strategy: String,
    pub max_chunk_size: usize,
    pub min_chunk_size: usize,
    pub overlap_size: usize,
    pub preserve_structure: bool,
    pub importance_threshold: f32,
    /// Explicit language code; detection is used when absent.
    pub language: Option<String>,
}

impl Default for ChunkingSection {
    fn default() -> Self {
        Self {
            strategy: "auto".to_string(),
            max_chunk_size: 512,
            min_chunk_size: 50,
            overlap_size: 50,
            preserve_structure: true,
            importance_threshold: 0.0,
            language: None,
        }
    }
}

/// `selection:` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectionSection {
    /// Consult the completion service when one is configured
    pub enabled: bool,
    /// Hard timeout for a single completion call
    pub timeout_secs: f64,
    /// Completion answers below this confidence are ignored
    pub min_confidence: f32,
    /// Best-effort budget for the whole analysis
    pub max_analysis_time_secs: f64,
}

impl Default for SelectionSection {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 10.0,
            min_confidence: 0.6,
            max_analysis_time_secs: 15.0,
        }
    }
}

/// `llm:` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSection {
    /// "none" disables the completion service
    pub provider: String,
    pub endpoint: Option<String>,
    pub model: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            endpoint: None,
            model: "llama3.2".to_string(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    chunking: Option<ChunkingSection>,
    selection: Option<SelectionSection>,
    llm: Option<LlmSection>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            chunking: ChunkingSection::default(),
            selection: SelectionSection::default(),
            llm: LlmSection::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and the environment.
    ///
    /// Environment variables:
    /// - `RECHUNK_WORKSPACE`: Override workspace path
    /// - `RECHUNK_CONFIG`: Path to config file
    /// - `RECHUNK_STRATEGY`: Default chunking strategy
    /// - `RECHUNK_LLM_PROVIDER`: Completion provider ("none", "ollama")
    /// - `RECHUNK_LLM_MODEL`: Completion model
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("RECHUNK_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("RECHUNK_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.config_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(strategy) = std::env::var("RECHUNK_STRATEGY") {
            config.chunking.strategy = strategy;
        }

        if let Ok(provider) = std::env::var("RECHUNK_LLM_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("RECHUNK_LLM_MODEL") {
            config.llm.model = model;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(chunking) = config_file.chunking {
            result.chunking = chunking;
        }

        if let Some(selection) = config_file.selection {
            result.selection = selection;
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Flags take precedence over the environment and the config file.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .rechunk directory.
    pub fn config_dir(&self) -> PathBuf {
        self.workspace.join(".rechunk")
    }

    /// Validate the merged configuration.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.llm.provider.to_lowercase();
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        let chunking = &self.chunking;
        if chunking.max_chunk_size == 0 {
            return Err(AppError::Config("maxChunkSize must be positive".into()));
        }
        if chunking.min_chunk_size > chunking.max_chunk_size {
            return Err(AppError::Config(format!(
                "minChunkSize ({}) exceeds maxChunkSize ({})",
                chunking.min_chunk_size, chunking.max_chunk_size
            )));
        }
        if chunking.overlap_size >= chunking.max_chunk_size {
            return Err(AppError::Config(format!(
                "overlapSize ({}) must be smaller than maxChunkSize ({})",
                chunking.overlap_size, chunking.max_chunk_size
            )));
        }

        if self.selection.timeout_secs <= 0.0 {
            return Err(AppError::Config("selection.timeoutSecs must be positive".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "none");
        assert_eq!(config.chunking.strategy, "auto");
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(None, None, None, true, false);

        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
chunking:
  strategy: smart
  maxChunkSize: 256
  minChunkSize: 20
  overlapSize: 16
llm:
  provider: ollama
  model: qwen2.5
logging:
  level: warn
  color: false
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.chunking.strategy, "smart");
        assert_eq!(merged.chunking.max_chunk_size, 256);
        // Unspecified keys keep their defaults
        assert!(merged.chunking.preserve_structure);
        assert_eq!(merged.llm.provider, "ollama");
        assert_eq!(merged.llm.model, "qwen2.5");
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn test_merge_yaml_invalid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "chunking: [not, a, map]").unwrap();

        assert!(matches!(
            AppConfig::default().merge_yaml(&path),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_size_invariants() {
        let mut config = AppConfig::default();
        config.chunking.min_chunk_size = 1000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.chunking.overlap_size = config.chunking.max_chunk_size;
        assert!(config.validate().is_err());
    }
}
