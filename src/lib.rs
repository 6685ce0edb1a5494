//! conceptmap - Transcript to Textbook Concept Mapping
//!
//! Links segments of educational video transcripts to the textbook concepts
//! they cover, using retrieval-augmented generation over a local corpus.
//!
//! # Overview
//!
//! conceptmap:
//! - Loads extracted textbook text from a directory
//! - Chunks and embeds it into an in-memory vector index
//! - Retrieves the chunks closest to a transcript segment
//! - Asks a chat model for concept/explanation/reference triples and parses them
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `loader` - Source document loading
//! - `chunking` - Overlapping window chunking
//! - `embedding` - Embedding generation
//! - `llm` - Chat model abstraction
//! - `vector_index` - In-memory vector index and readiness gate
//! - `rag` - Query pipeline, response parsing and citations
//! - `orchestrator` - Ingestion and service wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use conceptmap::config::Settings;
//! use conceptmap::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!     orchestrator.ingest().await?;
//!
//!     let mapping = orchestrator
//!         .mapper()
//!         .map_concepts("An object keeps moving unless a force stops it.")
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&mapping.concepts)?);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod loader;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod vector_index;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ConceptMapError, Result};
