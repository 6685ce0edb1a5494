//! Content chunking for breaking source documents into searchable windows.

mod window;

pub use window::TextChunker;

use crate::config::ChunkingSettings;
use crate::error::{ConceptMapError, Result};
use crate::loader::{source_name, SourceBlock};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A bounded window of source text with provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub text: String,
    /// Path of the document this chunk was cut from.
    pub source_path: PathBuf,
    /// Page count of the parent document, if known.
    pub page_count: Option<u32>,
    /// Position of this chunk within its document.
    pub sequence_index: usize,
}

impl Chunk {
    /// Create a chunk carrying the provenance of its parent block.
    pub fn from_block(block: &SourceBlock, text: String, sequence_index: usize) -> Self {
        Self {
            text,
            source_path: block.source_path.clone(),
            page_count: block.page_count,
            sequence_index,
        }
    }

    /// File name of the source document.
    pub fn source_name(&self) -> String {
        source_name(&self.source_path)
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks of one document.
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ConceptMapError::Config("chunk_size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(ConceptMapError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl TryFrom<&ChunkingSettings> for ChunkingConfig {
    type Error = ConceptMapError;

    fn try_from(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }
}

/// Trait for content chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split one document into ordered chunks.
    fn chunk(&self, block: &SourceBlock) -> Vec<Chunk>;

    /// Split every document, keeping document order.
    fn chunk_all(&self, blocks: &[SourceBlock]) -> Vec<Chunk> {
        blocks.iter().flat_map(|block| self.chunk(block)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_rejects_bad_overlap() {
        assert!(ChunkingConfig::new(100, 100).is_err());
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::new(100, 0).is_ok());
        assert_eq!(ChunkingConfig::new(1000, 200).unwrap(), ChunkingConfig::default());
    }

    #[test]
    fn test_chunk_source_name() {
        let block = SourceBlock::new("text", "/data/ncert/class9_physics.txt", Some(12));
        let chunk = Chunk::from_block(&block, "text".to_string(), 0);
        assert_eq!(chunk.source_name(), "class9_physics.txt");
        assert_eq!(chunk.page_count, Some(12));
    }
}
