//! Answer generation through hosted language models.

pub mod huggingface;
pub mod openai;

pub use huggingface::HuggingFaceProvider;
pub use openai::OpenAiProvider;

use crate::error::Result;

/// Trait implemented by concrete LLM providers.
pub trait LlmProvider: Send + Sync {
    /// Sends `prompt` to the model and returns the newly generated text.
    fn generate(&self, prompt: &str) -> Result<String>;
}

impl<P: LlmProvider + ?Sized> LlmProvider for std::sync::Arc<P> {
    fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt)
    }
}

/// Fixed sampling parameters shared by the providers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_new_tokens: usize,
    /// Whether the service should echo the prompt before the completion.
    pub return_full_text: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_new_tokens: 200,
            return_full_text: false,
        }
    }
}
