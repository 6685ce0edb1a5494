//! CLI output formatting utilities.

use crate::rag::{Citation, ConceptResult, ContextChunk, NOT_AVAILABLE};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print one mapped concept with its decomposed reference.
    pub fn concept(index: usize, concept: &ConceptResult) {
        println!("\n{} {}", style(format!("{}.", index)).cyan(), style(&concept.concept).bold());
        println!("   {}", concept.explanation);
        println!("   {}", style(&concept.reference).dim());

        let citation = concept.citation();
        let parts = citation_parts(&citation);
        if !parts.is_empty() {
            println!("   {}", style(parts.join(" | ")).dim());
        }
    }

    /// Print a retrieved chunk.
    pub fn search_result(rank: usize, chunk: &ContextChunk) {
        let pages = chunk
            .page_count
            .map(|n| format!(", {} pages", n))
            .unwrap_or_default();
        println!(
            "\n{} {} #{}{} (score: {:.2})",
            style(format!("{}.", rank)).green(),
            style(&chunk.source).bold(),
            chunk.sequence_index,
            pages,
            chunk.score
        );
        println!("   {}", content_preview(&chunk.content, 200));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Labelled citation fields that were actually found.
fn citation_parts(citation: &Citation) -> Vec<String> {
    [
        ("Class", &citation.grade),
        ("Subject", &citation.subject),
        ("Chapter", &citation.chapter),
        ("Section", &citation.section),
        ("Page", &citation.page),
    ]
    .into_iter()
    .filter(|(_, value)| value.as_str() != NOT_AVAILABLE)
    .map(|(label, value)| format!("{} {}", label, value))
    .collect()
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_parts_skip_missing_fields() {
        let citation = Citation::parse("NCERT Class 11, Chapter 6, Page 10");
        assert_eq!(citation_parts(&citation), vec!["Class 11", "Chapter 6", "Page 10"]);
    }

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("line one\nline two", 50), "line one line two");
        assert_eq!(content_preview("abcdef", 3), "abc...");
    }
}
