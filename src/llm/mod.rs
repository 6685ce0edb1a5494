//! Generative model access.

mod openai;

pub use openai::OpenAIChatModel;

use crate::error::Result;
use async_trait::async_trait;

/// Opaque text-in, text-out completion call.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send a fully rendered prompt and return the model's reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
