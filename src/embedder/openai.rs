//! OpenAI-compatible `/embeddings` client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{bearer_headers, describe_failure};
use crate::embeddings::Embedder;
use crate::error::{RagError, Result};

/// Default API base for OpenAI-compatible endpoints.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Blocking embeddings client that talks to OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    batch_size: usize,
}

impl OpenAiEmbedder {
    /// Builds a new OpenAI embeddings client.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        dimensions: Option<usize>,
        timeout: Duration,
        batch_size: usize,
    ) -> Result<Self> {
        if model.trim().is_empty() {
            return Err(RagError::config("missing OpenAI embedding model name"));
        }
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(bearer_headers(api_key, "OpenAI")?)
            .build()
            .map_err(|err| RagError::config(format!("failed to build OpenAI HTTP client: {err}")))?;
        let endpoint = format!("{}/embeddings", base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            model: model.trim().to_string(),
            dimensions,
            batch_size: batch_size.max(1),
        })
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        crate::embeddings::embed_single(self, text)
    }

    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        if inputs.len() > self.batch_size {
            return Err(RagError::EmbeddingService(format!(
                "batch of {} exceeds configured max {}",
                inputs.len(),
                self.batch_size
            )));
        }

        debug!(inputs = inputs.len(), model = %self.model, "requesting OpenAI embeddings");
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
            dimensions: self.dimensions,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|err| RagError::EmbeddingService(format!("request failed: {err}")))?;
        if !response.status().is_success() {
            return Err(RagError::EmbeddingService(describe_failure(response)));
        }
        let parsed: EmbeddingResponse = response.json().map_err(|err| {
            RagError::EmbeddingService(format!("failed to parse OpenAI embedding response: {err}"))
        })?;
        parsed.into_vectors(inputs.len())
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl EmbeddingResponse {
    fn into_vectors(mut self, expected: usize) -> Result<Vec<Vec<f32>>> {
        self.data.sort_by_key(|entry| entry.index);
        if self.data.len() != expected {
            return Err(RagError::EmbeddingService(format!(
                "OpenAI returned {} embeddings for {} inputs",
                self.data.len(),
                expected
            )));
        }
        Ok(self.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub_http::StubServer;
    use pretty_assertions::assert_eq;

    #[test]
    fn orders_vectors_by_index() {
        let body = r#"{"data": [
            {"embedding": [0.5, 0.5], "index": 1},
            {"embedding": [1.0, 0.0], "index": 0}
        ]}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.into_vectors(2).unwrap(),
            vec![vec![1.0, 0.0], vec![0.5, 0.5]]
        );
    }

    #[test]
    fn request_omits_missing_dimensions() {
        let inputs = ["hello"];
        let request = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &inputs,
            dimensions: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "text-embedding-3-small", "input": ["hello"]})
        );
    }

    #[test]
    fn rate_limited_request_fails_without_retry() {
        let server = StubServer::start(vec![(429, "rate limit reached")]);
        let embedder = OpenAiEmbedder::new(
            "sk-test",
            server.base_url(),
            "text-embedding-3-small",
            None,
            Duration::from_secs(2),
            8,
        )
        .unwrap();

        let err = embedder.embed("What is Python?").unwrap_err();

        assert!(matches!(err, RagError::EmbeddingService(_)));
        assert_eq!(server.requests(), 1);
    }
}
