//! Best-effort decomposition of textbook references.
//!
//! References come back from the model as free text such as
//! "NCERT Class 10 Science, Chapter 3, Page 50". Each field is matched on its
//! own and falls back to [`NOT_AVAILABLE`]; parsing never fails.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Value used for any field the reference does not mention.
pub const NOT_AVAILABLE: &str = "N/A";

/// Structured view of a reference string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub grade: String,
    pub subject: String,
    pub chapter: String,
    pub section: String,
    pub page: String,
    /// The reference exactly as given.
    pub original: String,
}

struct Patterns {
    grade: Regex,
    subject: Regex,
    chapter: Regex,
    section: Regex,
    page: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        grade: Regex::new(r"(?i)\bClass\s+(\d+)").expect("Invalid regex"),
        subject: Regex::new(r"\b([A-Za-z][\w-]*),\s*Chapter\b").expect("Invalid regex"),
        chapter: Regex::new(r"(?i)\bChapter\s+(\d+)").expect("Invalid regex"),
        section: Regex::new(r"(?i)\bSection\s+(\w+(?:\.\w+)*)").expect("Invalid regex"),
        page: Regex::new(r"(?i)\bPages?\s+(\d+)").expect("Invalid regex"),
    })
}

fn capture(regex: &Regex, text: &str) -> String {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

impl Citation {
    pub fn parse(reference: &str) -> Self {
        let p = patterns();
        Self {
            grade: capture(&p.grade, reference),
            subject: capture(&p.subject, reference),
            chapter: capture(&p.chapter, reference),
            section: capture(&p.section, reference),
            page: capture(&p.page, reference),
            original: reference.to_string(),
        }
    }
}
