//! Exact linear-scan vector index.

use super::{cosine_similarity, IndexedVector, SearchHit};
use crate::chunking::Chunk;
use crate::config::Settings;
use crate::embedding::Embedder;
use crate::error::{ConceptMapError, Result};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// How ingestion talks to the embedding provider.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    /// Chunks per embedding request.
    pub batch_size: usize,
    /// Embedding requests in flight at once.
    pub max_concurrent: usize,
    /// Deadline for each embedding request.
    pub timeout: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            batch_size: 64,
            max_concurrent: 4,
            timeout: Duration::from_secs(crate::openai::DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl From<&Settings> for BuildOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            batch_size: settings.embedding.batch_size.max(1),
            max_concurrent: settings.embedding.max_concurrent.max(1),
            timeout: settings.upstream_timeout(),
        }
    }
}

/// Immutable in-memory index. Safe to share between concurrent readers.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<IndexedVector>,
    dimensions: usize,
}

impl VectorIndex {
    /// Embed every chunk and build the index.
    ///
    /// Fails fast: the first failed, timed out or malformed batch aborts the
    /// build and nothing is returned.
    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn Embedder, options: &BuildOptions) -> Result<Self> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let batch_size = options.batch_size.max(1);
        let timeout = options.timeout;
        let batch_count = texts.len().div_ceil(batch_size);

        info!(
            "Embedding {} chunks in {} batches ({} concurrent)",
            texts.len(),
            batch_count,
            options.max_concurrent
        );

        let mut batches: Vec<(usize, Vec<Vec<f32>>)> = Vec::with_capacity(batch_count);

        let mut stream = stream::iter(texts.chunks(batch_size).enumerate())
            .map(|(idx, batch)| async move {
                let result = tokio::time::timeout(timeout, embedder.embed_batch(batch)).await;
                (idx, batch.len(), result)
            })
            .buffer_unordered(options.max_concurrent.max(1));

        while let Some((idx, expected, result)) = stream.next().await {
            let vectors = match result {
                Err(_) => {
                    return Err(ConceptMapError::Ingestion(format!(
                        "Embedding batch {} timed out after {:?}",
                        idx, timeout
                    )))
                }
                Ok(Err(e)) => {
                    return Err(ConceptMapError::Ingestion(format!("Embedding batch {} failed: {}", idx, e)))
                }
                Ok(Ok(vectors)) => vectors,
            };

            if vectors.len() != expected {
                return Err(ConceptMapError::Ingestion(format!(
                    "Embedding batch {} returned {} vectors for {} chunks",
                    idx,
                    vectors.len(),
                    expected
                )));
            }
            debug!("Embedded batch {}/{}", batches.len() + 1, batch_count);
            batches.push((idx, vectors));
        }

        batches.sort_by_key(|(idx, _)| *idx);
        let vectors = batches.into_iter().flat_map(|(_, vectors)| vectors);

        Self::from_vectors(chunks.into_iter().zip(vectors).collect(), embedder.dimensions())
    }

    /// Build an index from precomputed vectors, keeping their order.
    ///
    /// `dimensions` is only used when `entries` is empty; otherwise the first
    /// vector fixes the dimension and every other vector must match it.
    pub fn from_vectors(entries: Vec<(Chunk, Vec<f32>)>, dimensions: usize) -> Result<Self> {
        let dimensions = entries.first().map(|(_, v)| v.len()).unwrap_or(dimensions);
        if !entries.is_empty() && dimensions == 0 {
            return Err(ConceptMapError::Ingestion("Embedding provider returned empty vectors".to_string()));
        }

        let mut indexed = Vec::with_capacity(entries.len());
        for (chunk, vector) in entries {
            if vector.len() != dimensions {
                return Err(ConceptMapError::Ingestion(format!(
                    "Embedding for {} chunk {} has {} dimensions, expected {}",
                    chunk.source_name(),
                    chunk.sequence_index,
                    vector.len(),
                    dimensions
                )));
            }
            indexed.push(IndexedVector { chunk, vector });
        }

        Ok(Self {
            entries: indexed,
            dimensions,
        })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension shared by every vector in the index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Indexed entries in insertion order.
    pub fn entries(&self) -> &[IndexedVector] {
        &self.entries
    }

    /// The `k` most similar chunks, best first. Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.search_with_threshold(query, k, f32::NEG_INFINITY)
    }

    /// Like [`search`](Self::search), dropping hits scoring below `min_score`.
    pub fn search_with_threshold(&self, query: &[f32], k: usize, min_score: f32) -> Result<Vec<SearchHit>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(ConceptMapError::Upstream(format!(
                "Query embedding has {} dimensions, index expects {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, cosine_similarity(query, &entry.vector)))
            .filter(|(_, score)| *score >= min_score)
            .collect();

        // Stable sort, so ties stay in insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| SearchHit {
                chunk: self.entries[position].chunk.clone(),
                score,
            })
            .collect())
    }
}
