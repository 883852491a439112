//! Strategies command handler.

use clap::Args;
use rechunk_chunking::StrategyRegistry;
use rechunk_core::AppResult;
use tracing::instrument;

/// List the registered chunking strategies
#[derive(Args, Debug)]
pub struct StrategiesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StrategiesCommand {
    #[instrument(name = "strategies", skip_all)]
    pub async fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing strategies command");

        let entries = StrategyRegistry::with_builtins().snapshot();

        if self.json {
            let rows: Vec<serde_json::Value> = entries
                .iter()
                .map(|entry| {
                    serde_json::json!({
                        "name": entry.name,
                        "metadata": entry.metadata,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        for entry in entries {
            println!("{:<12} {:.2}  {}", entry.name, entry.metadata.priority_score, entry.metadata.description);
            println!("             suits: {}", entry.metadata.optimal_for_document_types.join(", "));
            println!("             strengths: {}", entry.metadata.strengths.join(", "));
        }

        Ok(())
    }
}
