//! Map command implementation.

use super::ingest::prepare;
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::ConceptResult;
use anyhow::Result;

/// Run the map command.
pub async fn run_map(transcript: &str, settings: Settings) -> Result<()> {
    let (orchestrator, _) = prepare(settings).await?;
    let mapper = orchestrator.mapper();

    let spinner = Output::spinner("Mapping concepts...");
    let result = mapper.map_concepts(transcript).await;
    spinner.finish_and_clear();

    let mapping = match result {
        Ok(mapping) => mapping,
        Err(e) => {
            Output::error(&format!("Concept mapping failed: {}", e));
            if let Some(raw) = e.raw_response() {
                Output::header("Raw response");
                println!("{}", raw);
            }
            return Err(e.into());
        }
    };

    if mapping.concepts.is_empty() {
        Output::warning("No direct concepts found for this transcript segment.");
        return Ok(());
    }

    Output::header("Concepts");
    for (i, object) in mapping.concepts.iter().enumerate() {
        match ConceptResult::from_object(object) {
            Ok(concept) => Output::concept(i + 1, &concept),
            Err(_) => println!("\n{}. {}", i + 1, serde_json::to_string_pretty(object)?),
        }
    }

    Output::header("Sources");
    for source in &mapping.sources {
        Output::kv(&source.source, &format!("chunk {} (score: {:.2})", source.sequence_index, source.score));
    }

    Ok(())
}
