//! Ingest command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::orchestrator::{IngestReport, Orchestrator};
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(settings: Settings) -> Result<()> {
    let (_, report) = prepare(settings).await?;

    Output::header("Index");
    Output::kv("Documents", &report.documents.to_string());
    Output::kv("Chunks", &report.chunks.to_string());
    Output::kv("Dimensions", &report.dimensions.to_string());

    Ok(())
}

/// Check requirements and create the orchestrator without ingesting.
pub(crate) fn prepare_orchestrator(settings: Settings) -> Result<Orchestrator> {
    preflight::check(&settings)?;
    Ok(Orchestrator::new(settings)?)
}

/// Check requirements, then build the index behind a spinner.
pub(crate) async fn prepare(settings: Settings) -> Result<(Orchestrator, IngestReport)> {
    let dir = settings.documents_dir();
    let orchestrator = prepare_orchestrator(settings)?;

    let spinner = Output::spinner(&format!("Indexing documents in {}...", dir.display()));
    let result = orchestrator.ingest().await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            Output::success(&format!(
                "Indexed {} chunks from {} documents",
                report.chunks, report.documents
            ));
            Ok((orchestrator, report))
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            Err(e.into())
        }
    }
}
