//! Query pipeline: transcript segment in, parsed concept objects out.

use super::context::{ContextChunk, RetrievalContext};
use super::parser::{is_no_concepts_reply, parse_concepts, ConceptObject};
use crate::config::{Prompts, Settings};
use crate::embedding::Embedder;
use crate::error::{ConceptMapError, Result};
use crate::llm::ChatModel;
use crate::vector_index::{IndexGate, SearchHit, VectorIndex};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Stages one query moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Idle,
    EmbeddingQuery,
    Searching,
    BuildingContext,
    InvokingModel,
    ParsingResponse,
    Done,
    Failed,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryStage::Idle => "idle",
            QueryStage::EmbeddingQuery => "embedding_query",
            QueryStage::Searching => "searching",
            QueryStage::BuildingContext => "building_context",
            QueryStage::InvokingModel => "invoking_model",
            QueryStage::ParsingResponse => "parsing_response",
            QueryStage::Done => "done",
            QueryStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Retrieval and timeout knobs for the mapper.
#[derive(Debug, Clone, Copy)]
pub struct MapperOptions {
    /// Chunks placed in the prompt.
    pub top_k: usize,
    /// Minimum similarity for a chunk to count as context.
    pub min_score: Option<f32>,
    /// Deadline for each embedding or model call.
    pub timeout: Duration,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_score: None,
            timeout: Duration::from_secs(crate::openai::DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl From<&Settings> for MapperOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            top_k: settings.retrieval.top_k,
            min_score: settings.retrieval.min_score,
            timeout: settings.upstream_timeout(),
        }
    }
}

/// Result of one successful query.
#[derive(Debug, Clone, Serialize)]
pub struct ConceptMapping {
    /// Parsed concept objects, as the model returned them.
    pub concepts: Vec<ConceptObject>,
    /// Chunks the prompt was grounded on, best first.
    pub sources: Vec<ContextChunk>,
    /// Unparsed model reply.
    pub raw_response: String,
}

/// Concept mapping service. Cheap to clone; every clone shares the same index.
#[derive(Clone)]
pub struct ConceptMapper {
    gate: Arc<IndexGate>,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn ChatModel>,
    prompts: Arc<Prompts>,
    options: MapperOptions,
}

impl ConceptMapper {
    pub fn new(
        gate: Arc<IndexGate>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn ChatModel>,
        prompts: Prompts,
        options: MapperOptions,
    ) -> Self {
        Self {
            gate,
            embedder,
            model,
            prompts: Arc::new(prompts),
            options,
        }
    }

    pub fn gate(&self) -> &Arc<IndexGate> {
        &self.gate
    }

    /// Map a transcript segment to textbook concepts.
    #[instrument(skip(self, transcript), fields(transcript_len = transcript.len()))]
    pub async fn map_concepts(&self, transcript: &str) -> Result<ConceptMapping> {
        let mut stage = QueryStage::Idle;
        let result = self.run_query(transcript, &mut stage).await;
        if let Err(e) = &result {
            warn!("Concept mapping failed during {}: {}", stage, e);
            advance(&mut stage, QueryStage::Failed);
        }
        result
    }

    /// Retrieve the `limit` chunks closest to a free-text query.
    #[instrument(skip(self, query))]
    pub async fn retrieve(&self, query: &str, limit: usize) -> Result<RetrievalContext> {
        let index = self.gate.ready()?;
        require_text(query, "Search query is required.")?;
        let vector = self.embed_query(query).await?;
        let hits = self.search_index(&index, &vector, limit)?;
        Ok(RetrievalContext::from_hits(hits))
    }

    /// Render the mapping prompt for a context and transcript segment.
    pub fn render_prompt(&self, context: &RetrievalContext, transcript: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_prompt_string());
        vars.insert("transcript".to_string(), transcript.to_string());
        self.prompts.render_with_custom(&self.prompts.mapping.user, &vars)
    }

    async fn run_query(&self, transcript: &str, stage: &mut QueryStage) -> Result<ConceptMapping> {
        let index = self.gate.ready()?;
        require_text(transcript, "Transcript segment is required for concept mapping.")?;
        info!("Mapping concepts for transcript: {}", preview(transcript.trim(), 100));

        advance(stage, QueryStage::EmbeddingQuery);
        let vector = self.embed_query(transcript).await?;

        advance(stage, QueryStage::Searching);
        let hits = self.search_index(&index, &vector, self.options.top_k)?;
        debug!("Index returned {} chunks", hits.len());

        advance(stage, QueryStage::BuildingContext);
        let context = RetrievalContext::from_hits(hits);
        if context.is_empty() {
            warn!("No relevant documents found for the transcript, continuing without context");
        }
        let prompt = self.render_prompt(&context, transcript);

        advance(stage, QueryStage::InvokingModel);
        let raw_response = call_upstream(self.options.timeout, "generative model", self.model.complete(&prompt)).await?;
        debug!("Raw model response: {}", raw_response);

        advance(stage, QueryStage::ParsingResponse);
        let concepts = if is_no_concepts_reply(&raw_response) {
            info!("Model reported no matching concepts");
            Vec::new()
        } else {
            parse_concepts(&raw_response)?
        };

        advance(stage, QueryStage::Done);
        info!("Mapped {} concepts from {} context chunks", concepts.len(), context.len());

        Ok(ConceptMapping {
            concepts,
            sources: context.into_chunks(),
            raw_response,
        })
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        call_upstream(self.options.timeout, "embedding provider", self.embedder.embed(text)).await
    }

    fn search_index(&self, index: &VectorIndex, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        match self.options.min_score {
            Some(min_score) => index.search_with_threshold(vector, limit, min_score),
            None => index.search(vector, limit),
        }
    }
}

fn advance(stage: &mut QueryStage, next: QueryStage) {
    debug!("Query stage {} -> {}", stage, next);
    *stage = next;
}

fn require_text(text: &str, message: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(ConceptMapError::InvalidInput(message.to_string()));
    }
    Ok(())
}

/// Await a provider call under a deadline; every failure becomes `Upstream`.
async fn call_upstream<T>(timeout: Duration, what: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(|e| e.into_upstream(what)),
        Err(_) => Err(ConceptMapError::Upstream(format!("{} timed out after {:?}", what, timeout))),
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut preview: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        preview.push_str("...");
    }
    preview
}
