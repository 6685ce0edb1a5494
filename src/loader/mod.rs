//! Source document loading.
//!
//! Turns a directory of extracted textbook text into raw blocks tagged with
//! where they came from. Binary-to-text extraction happens before this point.

mod text;

pub use text::TextDirectoryLoader;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Raw text of one source document plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceBlock {
    /// Full document text.
    pub text: String,
    /// Path of the file the text was read from.
    pub source_path: PathBuf,
    /// Number of pages, when the source was paginated.
    pub page_count: Option<u32>,
}

impl SourceBlock {
    pub fn new(text: impl Into<String>, source_path: impl Into<PathBuf>, page_count: Option<u32>) -> Self {
        Self {
            text: text.into(),
            source_path: source_path.into(),
            page_count,
        }
    }

    /// File name of the source, used when citing it in a prompt.
    pub fn source_name(&self) -> String {
        source_name(&self.source_path)
    }
}

/// File name component of a path, falling back to the full path.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Trait for document loaders.
pub trait DocumentLoader: Send + Sync {
    /// Load every document in a directory as one block each.
    fn load(&self, directory: &Path) -> Result<Vec<SourceBlock>>;
}
