//! Hugging Face hosted text-generation client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationParams, LlmProvider};
use crate::embedder::{bearer_headers, describe_failure};
use crate::error::{RagError, Result};

/// Default inference base URL; the model id is appended.
pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Blocking client for a hosted `text-generation` model.
pub struct HuggingFaceProvider {
    client: Client,
    endpoint: String,
    params: GenerationParams,
}

impl HuggingFaceProvider {
    /// Builds a client for `model` (e.g. `mistralai/Mistral-7B-Instruct-v0.3`).
    pub fn new(
        api_token: &str,
        base_url: &str,
        model: &str,
        params: GenerationParams,
        timeout: Duration,
    ) -> Result<Self> {
        if model.trim().is_empty() {
            return Err(RagError::config("missing generation model id"));
        }
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(bearer_headers(api_token, "Hugging Face")?)
            .build()
            .map_err(|err| RagError::config(format!("failed to build generation client: {err}")))?;
        let endpoint = format!("{}/{}", base_url.trim_end_matches('/'), model.trim());
        Ok(Self {
            client,
            endpoint,
            params,
        })
    }
}

impl LlmProvider for HuggingFaceProvider {
    fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerationRequest::new(prompt, &self.params);
        debug!(endpoint = %self.endpoint, prompt_chars = prompt.len(), "requesting generation");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|err| RagError::GenerationService(format!("request failed: {err}")))?;
        if !response.status().is_success() {
            return Err(RagError::GenerationService(describe_failure(response)));
        }
        let parsed: GenerationResponse = response
            .json()
            .map_err(|err| RagError::GenerationService(format!("malformed response: {err}")))?;
        parsed.into_text()
    }
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Serialize)]
struct GenerationParameters {
    temperature: f32,
    max_new_tokens: usize,
    return_full_text: bool,
}

impl<'a> GenerationRequest<'a> {
    fn new(prompt: &'a str, params: &GenerationParams) -> Self {
        Self {
            inputs: prompt,
            parameters: GenerationParameters {
                temperature: params.temperature,
                max_new_tokens: params.max_new_tokens,
                return_full_text: params.return_full_text,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct Generated {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerationResponse {
    Many(Vec<Generated>),
    One(Generated),
}

impl GenerationResponse {
    fn into_text(self) -> Result<String> {
        let generated = match self {
            Self::Many(items) => items.into_iter().next(),
            Self::One(item) => Some(item),
        };
        let text = generated
            .map(|item| item.generated_text.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(RagError::GenerationService(
                "response missing generated text".to_string(),
            ));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub_http::StubServer;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_carries_generation_parameters() {
        let body = GenerationRequest::new("Question: hi", &GenerationParams::default());
        let json = serde_json::to_value(&body).unwrap();
        let params = &json["parameters"];

        assert_eq!(json["inputs"], "Question: hi");
        assert!((params["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(params["max_new_tokens"], 200);
        assert_eq!(params["return_full_text"], false);
    }

    #[test]
    fn reads_list_and_object_responses() {
        let many: GenerationResponse =
            serde_json::from_str(r#"[{"generated_text": " Python is a language. "}]"#).unwrap();
        assert_eq!(many.into_text().unwrap(), "Python is a language.");

        let one: GenerationResponse =
            serde_json::from_str(r#"{"generated_text": "I don't know."}"#).unwrap();
        assert_eq!(one.into_text().unwrap(), "I don't know.");
    }

    #[test]
    fn empty_completion_is_a_service_error() {
        let empty: GenerationResponse = serde_json::from_str("[]").unwrap();
        assert!(matches!(
            empty.into_text().unwrap_err(),
            RagError::GenerationService(_)
        ));
    }

    #[test]
    fn missing_token_fails_fast() {
        let err = HuggingFaceProvider::new(
            "",
            DEFAULT_BASE_URL,
            "mistralai/Mistral-7B-Instruct-v0.3",
            GenerationParams::default(),
            Duration::from_secs(5),
        )
        .err()
        .expect("empty token rejected");
        assert!(matches!(err, RagError::Configuration(_)));
    }

    fn provider(server: &StubServer) -> HuggingFaceProvider {
        HuggingFaceProvider::new(
            "hf_test",
            server.base_url(),
            "mistralai/Mistral-7B-Instruct-v0.3",
            GenerationParams::default(),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[test]
    fn rate_limited_request_fails_without_retry() {
        let server = StubServer::start(vec![(429, "slow down")]);
        let err = provider(&server).generate("Question: What is Python?").unwrap_err();

        match err {
            RagError::GenerationService(message) => {
                assert!(message.contains("429"));
                assert!(message.contains("slow down"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(server.requests(), 1);
    }

    #[test]
    fn returns_trimmed_generated_text() {
        let server = StubServer::start(vec![(
            200,
            r#"[{"generated_text": " Python is a language. Thanks for asking!\n"}]"#,
        )]);
        let answer = provider(&server).generate("Question: What is Python?").unwrap();

        assert_eq!(answer, "Python is a language. Thanks for asking!");
    }
}
