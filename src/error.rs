//! Error types for conceptmap.

use thiserror::Error;

/// Library-level error type for conceptmap operations.
#[derive(Error, Debug)]
pub enum ConceptMapError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Loading, chunking or embedding the corpus failed. Fatal to startup.
    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    /// The index has not finished building (or never will).
    #[error("Concept mapping service not initialized: {0}")]
    NotReady(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Embedding or generative model call failed or timed out.
    #[error("Upstream provider error: {0}")]
    Upstream(String),

    /// The model reply could not be parsed into a list of concept objects.
    #[error("Model response could not be parsed: {message}")]
    ResponseFormat { message: String, raw: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ConceptMapError {
    /// Raw model text attached to a response format error.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ConceptMapError::ResponseFormat { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Wrap any error raised while talking to a provider as an upstream error.
    pub(crate) fn into_upstream(self, context: &str) -> Self {
        match self {
            ConceptMapError::Upstream(msg) => ConceptMapError::Upstream(format!("{}: {}", context, msg)),
            other => ConceptMapError::Upstream(format!("{}: {}", context, other)),
        }
    }
}

/// Result type alias for conceptmap operations.
pub type Result<T> = std::result::Result<T, ConceptMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response_only_on_format_errors() {
        let err = ConceptMapError::ResponseFormat {
            message: "not an array".to_string(),
            raw: "{}".to_string(),
        };
        assert_eq!(err.raw_response(), Some("{}"));
        assert!(ConceptMapError::NotReady("building".to_string()).raw_response().is_none());
    }

    #[test]
    fn test_into_upstream_keeps_message() {
        let err = ConceptMapError::Io(std::io::Error::other("connection reset"))
            .into_upstream("embedding query");
        match err {
            ConceptMapError::Upstream(msg) => {
                assert!(msg.starts_with("embedding query"));
                assert!(msg.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
