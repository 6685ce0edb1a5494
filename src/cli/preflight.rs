//! Pre-flight checks before expensive operations.
//!
//! Validates that the API key and the corpus are available before ingestion
//! starts, so a misconfiguration fails with a clear message.

use crate::config::Settings;
use crate::error::{ConceptMapError, Result};

/// Run pre-flight checks for any command that ingests the corpus.
pub fn check(settings: &Settings) -> Result<()> {
    check_api_key()?;
    check_documents_dir(settings)?;
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(ConceptMapError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(ConceptMapError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check that the documents directory exists.
fn check_documents_dir(settings: &Settings) -> Result<()> {
    let dir = settings.documents_dir();
    if dir.is_dir() {
        Ok(())
    } else {
        Err(ConceptMapError::Config(format!(
            "Documents directory {} does not exist. Set loader.documents_dir or CONCEPTMAP_DOCUMENTS_DIR.",
            dir.display()
        )))
    }
}
