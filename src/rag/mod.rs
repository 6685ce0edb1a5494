//! Retrieval-augmented concept mapping.
//!
//! Embeds a transcript segment, retrieves the closest textbook chunks and asks
//! the model which concepts they cover.

pub mod citation;
pub mod context;
pub mod parser;
mod pipeline;

pub use citation::{Citation, NOT_AVAILABLE};
pub use context::{ContextChunk, RetrievalContext, NO_CONTEXT_SENTINEL};
pub use parser::{extract_json_payload, is_no_concepts_reply, parse_concepts, ConceptObject};
pub use pipeline::{ConceptMapper, ConceptMapping, MapperOptions, QueryStage};

use crate::error::{ConceptMapError, Result};
use serde::{Deserialize, Serialize};

/// A concept linked to the textbook context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptResult {
    pub concept: String,
    pub explanation: String,
    pub reference: String,
}

impl ConceptResult {
    /// Typed view of one parsed object. Fails if a field is missing or not a string.
    pub fn from_object(object: &ConceptObject) -> Result<Self> {
        let field = |name: &str| -> Result<String> {
            object
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| ConceptMapError::ResponseFormat {
                    message: format!("concept object is missing a string '{}' field", name),
                    raw: serde_json::Value::Object(object.clone()).to_string(),
                })
        };

        Ok(Self {
            concept: field("concept")?,
            explanation: field("explanation")?,
            reference: field("reference")?,
        })
    }

    /// Decompose the reference string.
    pub fn citation(&self) -> Citation {
        Citation::parse(&self.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concept_result_from_object() {
        let objects = parse_concepts(
            r#"[{"concept":"Inertia","explanation":"Resistance to change in motion.","reference":"NCERT Class 9 Science, Chapter 9, Page 118","extra":1}]"#,
        )
        .unwrap();

        let concept = ConceptResult::from_object(&objects[0]).unwrap();
        assert_eq!(concept.concept, "Inertia");
        assert_eq!(concept.citation().subject, "Science");
        assert_eq!(concept.citation().page, "118");
    }

    #[test]
    fn test_concept_result_missing_field() {
        let objects = parse_concepts(r#"[{"concept":"Inertia","explanation":3}]"#).unwrap();
        let err = ConceptResult::from_object(&objects[0]).unwrap_err();
        match err {
            ConceptMapError::ResponseFormat { message, raw } => {
                assert!(message.contains("explanation"));
                assert!(raw.contains("Inertia"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
