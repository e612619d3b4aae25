//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationParams, LlmProvider};
use crate::embedder::{bearer_headers, describe_failure};
use crate::error::{RagError, Result};

/// Default API base for OpenAI-compatible endpoints.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Blocking chat-completions client.
pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    model: String,
    params: GenerationParams,
}

impl OpenAiProvider {
    /// Builds a client for the chat `model`.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        params: GenerationParams,
        timeout: Duration,
    ) -> Result<Self> {
        if model.trim().is_empty() {
            return Err(RagError::config("missing OpenAI chat model name"));
        }
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(bearer_headers(api_key, "OpenAI")?)
            .build()
            .map_err(|err| RagError::config(format!("failed to build OpenAI HTTP client: {err}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.trim().to_string(),
            params,
        })
    }
}

impl LlmProvider for OpenAiProvider {
    fn generate(&self, prompt: &str) -> Result<String> {
        // chat completions never echo the prompt, so return_full_text has no counterpart
        let body = ChatRequest {
            model: &self.model,
            temperature: self.params.temperature,
            max_tokens: self.params.max_new_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        debug!(model = %self.model, "requesting chat completion");
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|err| {
                RagError::GenerationService(format!("failed to call OpenAI chat completions: {err}"))
            })?;
        if !resp.status().is_success() {
            return Err(RagError::GenerationService(describe_failure(resp)));
        }
        let parsed: ChatResponse = resp.json().map_err(|err| {
            RagError::GenerationService(format!("failed to parse OpenAI response: {err}"))
        })?;
        parsed.into_text()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String> {
        let answer = self
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();
        if answer.is_empty() {
            return Err(RagError::GenerationService(
                "OpenAI response missing text content".to_string(),
            ));
        }
        Ok(answer)
    }
}
