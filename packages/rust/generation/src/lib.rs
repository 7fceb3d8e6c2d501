//! Generation capability for babelwiki.
//!
//! Defines the [`TextGenerator`] seam the pipeline depends on, the
//! OpenAI-compatible HTTP client implementing it, and the prompt contract
//! for article and summary generation. The pipeline receives a
//! `&dyn TextGenerator`, so tests swap in mocks without touching the
//! network.

pub mod client;
pub mod prompts;

use async_trait::async_trait;
use babelwiki_shared::{OpenAiConfig, Result};

pub use client::OpenAiClient;
pub use prompts::{article_request, generate_article, summarize, summary_request};

// ---------------------------------------------------------------------------
// Completion request
// ---------------------------------------------------------------------------

/// A single chat-style completion request: system instruction, user
/// instruction, and sampling parameters.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub params: SamplingParams,
}

/// Sampling parameters for a completion call.
///
/// These are tuning knobs, not correctness-critical, but they stay stable
/// across calls so the generated tone is reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
}

impl From<&OpenAiConfig> for SamplingParams {
    fn from(config: &OpenAiConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            presence_penalty: Some(config.presence_penalty),
            frequency_penalty: Some(config.frequency_penalty),
        }
    }
}

impl SamplingParams {
    /// The same parameters with penalty terms cleared — summaries don't
    /// need novelty encouragement.
    pub fn without_penalties(&self) -> Self {
        Self {
            presence_penalty: None,
            frequency_penalty: None,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Generator seam
// ---------------------------------------------------------------------------

/// Text-in/text-out completion capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one completion call, returning the generated text.
    ///
    /// Any transport failure, non-success status, malformed response, or
    /// timeout surfaces as [`babelwiki_shared::BabelWikiError::Generation`].
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}
