//! Prompt templates for conceptmap.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Phrase the model is told to emit when the context holds no related concepts.
pub const NO_CONCEPTS_PHRASE: &str = "No direct concepts found based on the provided context.";

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub mapping: MappingPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for concept mapping.
///
/// `user` must carry the `{{context}}` and `{{transcript}}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingPrompts {
    pub system: String,
    pub user: String,
}

impl Default for MappingPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an assistant that links educational video content to textbook material.
You answer only from the textbook context you are given and you always reply in the exact output format requested."#
                .to_string(),

            user: format!(
                r#"Given the following context from textbooks:
---
{{{{context}}}}
---
And the following video transcript segment:
"{{{{transcript}}}}"

Identify 3-5 distinct scientific/mathematical/historical concepts or topics from the textbook context that are directly related to the video transcript segment. For each concept, provide:
1. The concept name.
2. A brief, 1-2 sentence explanation of the concept based on the textbook context.
3. A specific reference from the textbook context (e.g., "NCERT Class 10 Science, Chapter 3, Page 50, Paragraph 2"). If a specific page or paragraph is not possible, provide the chapter name.

If no direct concepts are found, state "{}"
Provide the output as a JSON array of objects, like so:
[
    {{
        "concept": "Concept Name",
        "explanation": "Brief explanation...",
        "reference": "NCERT Class X Subject, Chapter Y, Page Z"
    }}
]"#,
                NO_CONCEPTS_PHRASE
            ),
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("Invalid regex"))
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let mapping_path = custom_path.join("mapping.toml");
            if mapping_path.exists() {
                let content = std::fs::read_to_string(&mapping_path)?;
                prompts.mapping = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass, so placeholder-like text inside a value is
    /// left alone. Unknown placeholders are kept verbatim.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_has_placeholders() {
        let prompts = Prompts::default();
        assert!(prompts.mapping.user.contains("{{context}}"));
        assert!(prompts.mapping.user.contains("{{transcript}}"));
        assert!(prompts.mapping.user.contains(NO_CONCEPTS_PHRASE));
        assert!(prompts.mapping.user.contains("\"concept\": \"Concept Name\""));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_expand_inside_values() {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), "say {{context}} twice".to_string());
        vars.insert("context".to_string(), "CTX".to_string());

        let result = Prompts::render("{{context}} | {{transcript}} | {{missing}}", &vars);
        assert_eq!(result, "CTX | say {{context}} twice | {{missing}}");
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("board".to_string(), "CBSE".to_string());
        prompts.variables.insert("context".to_string(), "stale".to_string());

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "fresh".to_string());

        let result = prompts.render_with_custom("{{board}}: {{context}}", &vars);
        assert_eq!(result, "CBSE: fresh");
    }

    #[test]
    fn test_load_custom_mapping_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("mapping.toml"),
            "system = \"sys\"\nuser = \"{{context}} / {{transcript}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.mapping.system, "sys");
        assert_eq!(prompts.mapping.user, "{{context}} / {{transcript}}");
    }
}
