//! Context building for concept mapping prompts.

use crate::vector_index::SearchHit;
use serde::Serialize;

/// Placeholder handed to the model when retrieval found nothing.
pub const NO_CONTEXT_SENTINEL: &str = "No relevant context found from the source documents.";

const DOCUMENT_SEPARATOR: &str = "\n\n---\n\n";

/// A retrieved chunk, trimmed to what prompts and callers need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextChunk {
    /// File name of the source document.
    pub source: String,
    /// Pages in the source document, when known.
    pub page_count: Option<u32>,
    /// Position of the chunk within its document.
    pub sequence_index: usize,
    /// Chunk text.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchHit> for ContextChunk {
    fn from(hit: SearchHit) -> Self {
        Self {
            source: hit.chunk.source_name(),
            page_count: hit.chunk.page_count,
            sequence_index: hit.chunk.sequence_index,
            content: hit.chunk.text,
            score: hit.score,
        }
    }
}

/// Retrieved chunks in rank order, most similar first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalContext {
    chunks: Vec<ContextChunk>,
}

impl RetrievalContext {
    pub fn from_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            chunks: hits.into_iter().map(ContextChunk::from).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[ContextChunk] {
        &self.chunks
    }

    pub fn into_chunks(self) -> Vec<ContextChunk> {
        self.chunks
    }

    /// The context string substituted into the prompt.
    pub fn to_prompt_string(&self) -> String {
        if self.chunks.is_empty() {
            NO_CONTEXT_SENTINEL.to_string()
        } else {
            format_context_for_prompt(&self.chunks)
        }
    }
}

/// Format context chunks for a prompt, annotating each with its source.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let pages = chunk
                .page_count
                .map(|n| format!(" (Pages: {})", n))
                .unwrap_or_default();
            format!("Document {} (Source: {}){}:\n{}", i + 1, chunk.source, pages, chunk.content)
        })
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use crate::loader::SourceBlock;

    fn hit(path: &str, pages: Option<u32>, text: &str, score: f32) -> SearchHit {
        let block = SourceBlock::new(text, path, pages);
        SearchHit {
            chunk: Chunk::from_block(&block, text.to_string(), 2),
            score,
        }
    }

    #[test]
    fn test_format_annotates_sources_in_rank_order() {
        let context = RetrievalContext::from_hits(vec![
            hit("/ncert/class9/motion.txt", Some(18), "Inertia is...", 0.9),
            hit("/ncert/class7/plants.txt", None, "Leaves make food.", 0.4),
        ]);

        assert_eq!(
            context.to_prompt_string(),
            "Document 1 (Source: motion.txt) (Pages: 18):\nInertia is...\n\n---\n\nDocument 2 (Source: plants.txt):\nLeaves make food."
        );
        assert_eq!(context.chunks()[0].sequence_index, 2);
    }

    #[test]
    fn test_empty_context_uses_sentinel() {
        let context = RetrievalContext::default();
        assert!(context.is_empty());
        assert_eq!(context.to_prompt_string(), NO_CONTEXT_SENTINEL);
    }
}
