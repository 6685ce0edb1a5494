//! Service orchestrator for conceptmap.
//!
//! Owns the providers and the index gate, runs ingestion once and hands out
//! concept mappers that share the built index.

use crate::chunking::{Chunker, ChunkingConfig, TextChunker};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::llm::{ChatModel, OpenAIChatModel};
use crate::loader::{DocumentLoader, TextDirectoryLoader};
use crate::rag::{ConceptMapper, MapperOptions};
use crate::vector_index::{BuildOptions, IndexGate, VectorIndex};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Summary of a finished ingestion run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub dimensions: usize,
}

/// The main orchestrator for the conceptmap service.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    loader: Arc<dyn DocumentLoader>,
    chunker: TextChunker,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn ChatModel>,
    gate: Arc<IndexGate>,
}

impl Orchestrator {
    /// Create a new orchestrator backed by OpenAI.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let timeout = settings.upstream_timeout();

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
            timeout,
        )?);

        let model: Arc<dyn ChatModel> = Arc::new(
            OpenAIChatModel::new(&settings.model.model, settings.model.temperature, timeout)?
                .with_system_prompt(prompts.mapping.system.clone()),
        );

        let loader: Arc<dyn DocumentLoader> =
            Arc::new(TextDirectoryLoader::with_extensions(&settings.loader.extensions));

        Self::with_components(settings, prompts, loader, embedder, model)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        loader: Arc<dyn DocumentLoader>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let chunker = TextChunker::new(ChunkingConfig::try_from(&settings.chunking)?);

        Ok(Self {
            settings,
            prompts,
            loader,
            chunker,
            embedder,
            model,
            gate: Arc::new(IndexGate::new()),
        })
    }

    /// Get the readiness gate shared with every mapper.
    pub fn gate(&self) -> Arc<IndexGate> {
        self.gate.clone()
    }

    /// A concept mapper over this orchestrator's index.
    pub fn mapper(&self) -> ConceptMapper {
        ConceptMapper::new(
            self.gate.clone(),
            self.embedder.clone(),
            self.model.clone(),
            self.prompts.clone(),
            MapperOptions::from(&self.settings),
        )
    }

    /// Load, chunk and embed the corpus, then publish the index.
    ///
    /// On failure the gate is marked failed and stays that way.
    #[instrument(skip(self), fields(dir = %self.settings.documents_dir().display()))]
    pub async fn ingest(&self) -> Result<IngestReport> {
        let started = Instant::now();
        match self.build_index().await {
            Ok((documents, index)) => {
                let chunks = index.len();
                let dimensions = index.dimensions();
                self.gate.publish(index)?;
                info!(
                    "Index ready: {} chunks from {} documents ({} dimensions) in {:.1}s",
                    chunks,
                    documents,
                    dimensions,
                    started.elapsed().as_secs_f32()
                );
                Ok(IngestReport {
                    documents,
                    chunks,
                    dimensions,
                })
            }
            Err(e) => {
                error!("Ingestion failed: {}", e);
                self.gate.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn build_index(&self) -> Result<(usize, VectorIndex)> {
        let dir = self.settings.documents_dir();

        info!("Loading documents from {}", dir.display());
        let blocks = self.loader.load(&dir)?;

        let chunks = self.chunker.chunk_all(&blocks);
        info!("Split {} documents into {} chunks", blocks.len(), chunks.len());

        let options = BuildOptions::from(&self.settings);
        let index = VectorIndex::build(chunks, self.embedder.as_ref(), &options).await?;
        Ok((blocks.len(), index))
    }
}
