//! Parsing of model replies into concept objects.
//!
//! Models are asked for a bare JSON array but often wrap it in a markdown
//! fence or add commentary around it.

use crate::error::{ConceptMapError, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// One element of the parsed array, kept as the model produced it.
pub type ConceptObject = serde_json::Map<String, Value>;

/// Lowercased prefix of the reply the model gives when nothing matched.
const NO_CONCEPTS_MARKER: &str = "no direct concepts found";

/// A fenced block whose fences each start a line. Captures the info tag and body.
fn fenced_block() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?ms)^[ \t]*```[ \t]*([\w+.-]*)[ \t]*\r?\n(.*?)^[ \t]*```").expect("Invalid regex")
    })
}

/// A `json` fence anywhere in the text, for replies that do not put fences on their own lines.
fn inline_json_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"(?is)```json[ \t]*(.*?)```").expect("Invalid regex"))
}

/// The part of a reply that should hold the JSON payload.
///
/// A `json`-tagged block wins over an untagged one, and blocks tagged with any
/// other language are skipped. Without a usable fence the whole reply is used.
pub fn extract_json_payload(reply: &str) -> &str {
    let mut untagged = None;
    for caps in fenced_block().captures_iter(reply) {
        let (Some(tag), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if tag.as_str().eq_ignore_ascii_case("json") {
            return body.as_str();
        }
        if tag.as_str().is_empty() && untagged.is_none() {
            untagged = Some(body.as_str());
        }
    }

    untagged
        .or_else(|| {
            inline_json_fence()
                .captures(reply)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
        })
        .unwrap_or(reply)
}

/// Parse a reply into a list of JSON objects.
///
/// Every failure carries the unmodified reply.
pub fn parse_concepts(reply: &str) -> Result<Vec<ConceptObject>> {
    let payload = extract_json_payload(reply).trim();

    let value: Value = serde_json::from_str(payload).map_err(|e| format_error(format!("invalid JSON: {}", e), reply))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(format_error(
                format!("expected a JSON array, got {}", json_kind(&other)),
                reply,
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(object) => Ok(object),
            other => Err(format_error(
                format!("array element {} is {}, expected an object", i, json_kind(&other)),
                reply,
            )),
        })
        .collect()
}

/// Whether the reply is the model's "no concepts" answer rather than JSON.
pub fn is_no_concepts_reply(reply: &str) -> bool {
    extract_json_payload(reply)
        .trim()
        .trim_start_matches(['"', '\''])
        .to_lowercase()
        .starts_with(NO_CONCEPTS_MARKER)
}

fn format_error(message: String, reply: &str) -> ConceptMapError {
    ConceptMapError::ResponseFormat {
        message,
        raw: reply.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NO_CONCEPTS_PHRASE;

    const ARRAY: &str = r#"[{"concept":"Work","explanation":"Force times displacement.","reference":"NCERT Class 11, Chapter 6, Page 10"}]"#;

    #[test]
    fn test_bare_array() {
        let concepts = parse_concepts(ARRAY).unwrap();
        assert_eq!(concepts.len(), 1);
        assert_eq!(concepts[0]["concept"], "Work");
    }

    #[test]
    fn test_json_fence_matches_bare_result() {
        let fenced = format!("```json\n{}\n```", ARRAY);
        assert_eq!(parse_concepts(&fenced).unwrap(), parse_concepts(ARRAY).unwrap());
    }

    #[test]
    fn test_fence_with_commentary() {
        let reply = format!(
            "Here you go:\n```json\n{}\n```\nLet me know if you need more.",
            ARRAY
        );
        let concepts = parse_concepts(&reply).unwrap();
        assert_eq!(concepts.len(), 1);
        assert_eq!(concepts[0]["concept"], "Work");
    }

    #[test]
    fn test_untagged_fence() {
        let reply = format!("Result:\n```\n{}\n```", ARRAY);
        assert_eq!(parse_concepts(&reply).unwrap().len(), 1);
    }

    #[test]
    fn test_json_fence_preferred_over_untagged() {
        let reply = format!("```\nnot json\n```\n\n```JSON\r\n{}\r\n```", ARRAY);
        assert_eq!(extract_json_payload(&reply).trim(), ARRAY);
    }

    #[test]
    fn test_other_language_block_is_skipped() {
        let reply = "```python\nx=1\n```\n```\n[{\"a\":1}]\n```";
        let concepts = parse_concepts(reply).unwrap();
        assert_eq!(concepts.len(), 1);
        assert_eq!(concepts[0]["a"], 1);

        let reply = format!("```python\nprint(1)\n```\nThen:\n```json\n{}\n```", ARRAY);
        assert_eq!(extract_json_payload(&reply).trim(), ARRAY);
    }

    #[test]
    fn test_inline_json_fence() {
        let reply = format!("Here: ```json {} ```", ARRAY);
        assert_eq!(parse_concepts(&reply).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(parse_concepts("[]").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json_carries_raw() {
        let reply = "```json\n[{\"concept\": \"Work\",]\n```";
        let err = parse_concepts(reply).unwrap_err();
        assert!(matches!(err, ConceptMapError::ResponseFormat { .. }));
        assert_eq!(err.raw_response(), Some(reply));
    }

    #[test]
    fn test_non_array_rejected() {
        let err = parse_concepts(r#"{"concept": "Work"}"#).unwrap_err();
        match err {
            ConceptMapError::ResponseFormat { message, raw } => {
                assert!(message.contains("an object"));
                assert_eq!(raw, r#"{"concept": "Work"}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_object_elements_rejected() {
        for reply in [r#"[{"concept": "Work"}, "Energy"]"#, "[null]", "[[1, 2]]", "[3]"] {
            let err = parse_concepts(reply).unwrap_err();
            assert_eq!(err.raw_response(), Some(reply));
        }
    }

    #[test]
    fn test_no_concepts_phrase_is_not_json() {
        let err = parse_concepts(NO_CONCEPTS_PHRASE).unwrap_err();
        assert!(matches!(err, ConceptMapError::ResponseFormat { .. }));
        assert_eq!(err.raw_response(), Some(NO_CONCEPTS_PHRASE));
    }

    #[test]
    fn test_recognizes_no_concepts_reply() {
        assert!(is_no_concepts_reply(NO_CONCEPTS_PHRASE));
        assert!(is_no_concepts_reply("  \"No direct concepts found based on the provided context.\"\n"));
        assert!(is_no_concepts_reply("```\nNo direct concepts found.\n```"));
        assert!(!is_no_concepts_reply(ARRAY));
        assert!(!is_no_concepts_reply("There are no direct concepts found here"));
    }
}
