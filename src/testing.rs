//! Deterministic embedder and model doubles for tests.

use crate::embedding::Embedder;
use crate::error::{ConceptMapError, Result};
use crate::llm::ChatModel;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const VOCABULARY: &[&str] = &[
    "inertia",
    "motion",
    "force",
    "newton",
    "mass",
    "rest",
    "photosynthesis",
    "chlorophyll",
    "sunlight",
    "plants",
    "glucose",
    "energy",
    "work",
];

/// Bag-of-words embedder over a small fixed vocabulary.
pub struct KeywordEmbedder {
    embed_calls: AtomicUsize,
    batch_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    fail_on: Option<String>,
    delay: Option<Duration>,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            embed_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            fail_on: None,
            delay: None,
        }
    }

    /// Fail any call whose input mentions `word`.
    pub fn failing_on(mut self, word: &str) -> Self {
        self.fail_on = Some(word.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst) + self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Most `embed_batch` calls that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric()).collect();
        VOCABULARY
            .iter()
            .map(|word| tokens.iter().filter(|t| *t == word).count() as f32)
            .collect()
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(word) = &self.fail_on {
            if text.to_lowercase().contains(word.as_str()) {
                return Err(ConceptMapError::Upstream(format!("rate limited on '{}'", word)));
            }
        }
        Ok(self.vector_for(text))
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        self.embed_one(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        let mut vectors = Vec::with_capacity(texts.len());
        let mut result = Ok(());
        for text in texts {
            match self.embed_one(text).await {
                Ok(vector) => vectors.push(vector),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result.map(|_| vectors)
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len()
    }
}

/// Model that replies with a fixed text and records the prompts it saw.
pub struct ScriptedModel {
    reply: std::result::Result<String, String>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().map_err(ConceptMapError::Upstream)
    }
}
