//! Search command implementation.

use super::ingest::prepare;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    let (orchestrator, _) = prepare(settings).await?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.mapper().retrieve(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(context) => {
            if context.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", context.len()));

                for (i, chunk) in context.chunks().iter().enumerate() {
                    Output::search_result(i + 1, chunk);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
