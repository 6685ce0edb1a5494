//! Plain-text directory loader.
//!
//! Reads text produced by PDF-to-text tools, where a form feed separates pages.

use super::{DocumentLoader, SourceBlock};
use crate::error::{ConceptMapError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PAGE_BREAK: char = '\x0c';

/// Loads `.txt`/`.md` style files from a single directory level.
pub struct TextDirectoryLoader {
    extensions: Vec<String>,
}

impl TextDirectoryLoader {
    pub fn new() -> Self {
        Self::with_extensions(&["txt", "md"])
    }

    pub fn with_extensions<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Check if path has one of the accepted extensions.
    fn is_document_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Matching files in the directory, sorted by name.
    fn collect_files(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(directory).map_err(|e| {
            ConceptMapError::Ingestion(format!("Cannot read documents directory {}: {}", directory.display(), e))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| ConceptMapError::Ingestion(format!("Cannot list {}: {}", directory.display(), e)))?
                .path();
            if path.is_file() && self.is_document_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Default for TextDirectoryLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for TextDirectoryLoader {
    fn load(&self, directory: &Path) -> Result<Vec<SourceBlock>> {
        let files = self.collect_files(directory)?;
        if files.is_empty() {
            return Err(ConceptMapError::Ingestion(format!(
                "No documents with extensions [{}] found in {}",
                self.extensions.join(", "),
                directory.display()
            )));
        }

        let mut blocks = Vec::with_capacity(files.len());
        for path in files {
            debug!("Loading document {}", path.display());
            let raw = std::fs::read_to_string(&path).map_err(|e| {
                ConceptMapError::Ingestion(format!("Cannot read document {}: {}", path.display(), e))
            })?;
            let (text, page_count) = split_pages(&raw);
            blocks.push(SourceBlock::new(text, path, page_count));
        }

        info!("Loaded {} documents from {}", blocks.len(), directory.display());
        Ok(blocks)
    }
}

/// Replace page breaks with blank lines and count the pages they delimit.
///
/// Extractors usually terminate every page with a form feed, so a single
/// trailing one does not start a new page.
fn split_pages(raw: &str) -> (String, Option<u32>) {
    if !raw.contains(PAGE_BREAK) {
        return (raw.to_string(), None);
    }

    let body = raw.strip_suffix(PAGE_BREAK).unwrap_or(raw);
    let pages = body.matches(PAGE_BREAK).count() as u32 + 1;
    (body.replace(PAGE_BREAK, "\n\n"), Some(pages))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages() {
        assert_eq!(split_pages("no breaks"), ("no breaks".to_string(), None));
        assert_eq!(split_pages("one\x0ctwo\x0c"), ("one\n\ntwo".to_string(), Some(2)));
        assert_eq!(split_pages("one\x0ctwo\x0cthree"), ("one\n\ntwo\n\nthree".to_string(), Some(3)));
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_physics.txt"), "Inertia\x0cForce\x0c").unwrap();
        std::fs::write(dir.path().join("a_biology.md"), "Photosynthesis").unwrap();
        std::fs::write(dir.path().join("cover.pdf"), [0u8, 1, 2]).unwrap();
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let blocks = TextDirectoryLoader::new().load(dir.path()).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].source_name(), "a_biology.md");
        assert_eq!(blocks[0].page_count, None);
        assert_eq!(blocks[1].source_name(), "b_physics.txt");
        assert_eq!(blocks[1].page_count, Some(2));
        assert_eq!(blocks[1].text, "Inertia\n\nForce");
    }

    #[test]
    fn test_custom_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chapter.TEXT"), "Motion").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let blocks = TextDirectoryLoader::with_extensions(&[".text"]).load(dir.path()).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Motion");
    }

    #[test]
    fn test_empty_directory_fails_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        let err = TextDirectoryLoader::new().load(dir.path()).unwrap_err();
        assert!(matches!(err, ConceptMapError::Ingestion(_)));
    }

    #[test]
    fn test_missing_directory_fails_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        let err = TextDirectoryLoader::new().load(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, ConceptMapError::Ingestion(_)));
    }

    #[test]
    fn test_unreadable_file_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.txt"), "Inertia").unwrap();
        std::fs::write(dir.path().join("bad.txt"), [0xffu8, 0xfe, 0x00]).unwrap();

        let err = TextDirectoryLoader::new().load(dir.path()).unwrap_err();
        match err {
            ConceptMapError::Ingestion(msg) => assert!(msg.contains("bad.txt")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
