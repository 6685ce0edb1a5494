//! Overlapping fixed-size window chunking.
//!
//! Windows end on the most natural break available (paragraph, line,
//! sentence, word) and fall back to a hard cut. The next window always starts
//! `chunk_overlap` characters before the previous one ended, so stripping the
//! overlap from every chunk after the first rebuilds the document.

use super::{Chunk, Chunker, ChunkingConfig};
use crate::loader::SourceBlock;

/// Character-window chunker.
#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkingConfig,
}

impl TextChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split text into overlapping windows.
    fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut windows = Vec::new();
        let mut start = 0;

        loop {
            if total - start <= self.config.chunk_size {
                windows.push(chars[start..].iter().collect());
                break;
            }

            let end = self.find_break_point(&chars, start);
            windows.push(chars[start..end].iter().collect());
            start = end - self.config.chunk_overlap;
        }

        windows
    }

    /// Find the end (exclusive) of the window starting at `start`.
    ///
    /// Only called when more than `chunk_size` characters remain. Any break
    /// past the overlap counts, so every window advances; the latest break of
    /// the best kind wins.
    fn find_break_point(&self, chars: &[char], start: usize) -> usize {
        let hard_end = start + self.config.chunk_size;
        let earliest = start + self.config.chunk_overlap + 1;

        let mut paragraph = None;
        let mut line = None;
        let mut sentence = None;
        let mut word = None;

        for end in (earliest..=hard_end).rev() {
            let last = chars[end - 1];
            if last == '\n' {
                if paragraph.is_none() && end >= start + 2 && chars[end - 2] == '\n' {
                    paragraph = Some(end);
                }
                line.get_or_insert(end);
            }
            if matches!(last, '.' | '!' | '?') && chars[end].is_whitespace() {
                sentence.get_or_insert(end);
            }
            if last.is_whitespace() {
                word.get_or_insert(end);
            }
            if paragraph.is_some() {
                break;
            }
        }

        paragraph.or(line).or(sentence).or(word).unwrap_or(hard_end)
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

impl Chunker for TextChunker {
    fn chunk(&self, block: &SourceBlock) -> Vec<Chunk> {
        self.split(&block.text)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk::from_block(block, text, index))
            .collect()
    }
}
