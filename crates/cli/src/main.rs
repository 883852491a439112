//! rechunk CLI
//!
//! Main entry point for the rechunk command-line tool.
//! Chunks documents for retrieval and inspects chunking decisions.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ChunkCommand, DetectCommand, EstimateCommand, StrategiesCommand};
use rechunk_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// rechunk - language-aware document chunking for retrieval
#[derive(Parser, Debug)]
#[command(name = "rechunk")]
#[command(about = "Language-aware document chunking for retrieval", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "RECHUNK_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "RECHUNK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Completion provider for auto selection (none, ollama)
    #[arg(short, long, global = true, env = "RECHUNK_LLM_PROVIDER")]
    provider: Option<String>,

    /// Completion model identifier
    #[arg(short, long, global = true, env = "RECHUNK_LLM_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split documents into chunks
    Chunk(ChunkCommand),

    /// Estimate chunk counts without chunking
    Estimate(EstimateCommand),

    /// Show detected language, domain and strategy choice
    Detect(DetectCommand),

    /// List available chunking strategies
    Strategies(StrategiesCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from file and environment
    let mut config = AppConfig::load()?;
    if let Some(config_file) = &cli.config {
        config = config.merge_yaml(config_file)?;
    }

    // Apply CLI overrides
    let mut config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    if let Some(provider) = cli.provider {
        config.llm.provider = provider;
    }
    if let Some(model) = cli.model {
        config.llm.model = model;
    }
    config.validate()?;

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("rechunk starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Completion provider: {}", config.llm.provider);

    // Route to command handlers; each handler is instrumented with its own span
    let result = match cli.command {
        Commands::Chunk(cmd) => cmd.execute(&config).await,
        Commands::Estimate(cmd) => cmd.execute(&config).await,
        Commands::Detect(cmd) => cmd.execute(&config).await,
        Commands::Strategies(cmd) => cmd.execute().await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
