//! Configuration module for conceptmap.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{MappingPrompts, Prompts, NO_CONCEPTS_PHRASE};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, LoaderSettings, ModelSettings,
    PromptSettings, RetrievalSettings, ServerSettings, Settings, UpstreamSettings,
};
