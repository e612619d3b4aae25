//! Hugging Face feature-extraction embedding client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{bearer_headers, describe_failure};
use crate::embeddings::Embedder;
use crate::error::{RagError, Result};

/// Default inference base URL; the model id and pipeline path are appended.
pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Blocking client for the hosted `feature-extraction` pipeline.
#[derive(Clone)]
pub struct HuggingFaceEmbedder {
    client: Client,
    endpoint: String,
    batch_size: usize,
}

impl HuggingFaceEmbedder {
    /// Builds a client for `model` (e.g. `sentence-transformers/all-mpnet-base-v2`).
    pub fn new(
        api_token: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
        batch_size: usize,
    ) -> Result<Self> {
        if model.trim().is_empty() {
            return Err(RagError::config("missing embedding model id"));
        }
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(bearer_headers(api_token, "Hugging Face")?)
            .build()
            .map_err(|err| RagError::config(format!("failed to build embedding client: {err}")))?;
        let endpoint = format!(
            "{}/{}/pipeline/feature-extraction",
            base_url.trim_end_matches('/'),
            model.trim()
        );
        Ok(Self {
            client,
            endpoint,
            batch_size: batch_size.max(1),
        })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Embedder for HuggingFaceEmbedder {
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

        debug!(inputs = inputs.len(), endpoint = %self.endpoint, "requesting embeddings");
        let request = FeatureExtractionRequest { inputs };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|err| RagError::EmbeddingService(format!("request failed: {err}")))?;
        if !response.status().is_success() {
            return Err(RagError::EmbeddingService(describe_failure(response)));
        }
        let parsed: FeatureExtractionResponse = response
            .json()
            .map_err(|err| RagError::EmbeddingService(format!("malformed response: {err}")))?;
        parsed.into_vectors(inputs.len())
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [&'a str],
}

/// Sentence-transformer models return one pooled vector per input; plain encoders return
/// one vector per token, which is mean-pooled here.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Pooled(Vec<Vec<f32>>),
    PerToken(Vec<Vec<Vec<f32>>>),
}

impl FeatureExtractionResponse {
    fn into_vectors(self, expected: usize) -> Result<Vec<Vec<f32>>> {
        let vectors: Vec<Vec<f32>> = match self {
            Self::Pooled(vectors) => vectors,
            Self::PerToken(tokens) => tokens.into_iter().map(mean_pool).collect(),
        };
        if vectors.len() != expected {
            return Err(RagError::EmbeddingService(format!(
                "service returned {} embeddings for {} inputs",
                vectors.len(),
                expected
            )));
        }
        if vectors.iter().any(|vector| vector.is_empty()) {
            return Err(RagError::EmbeddingService(
                "service returned an empty embedding".to_string(),
            ));
        }
        Ok(vectors)
    }
}

fn mean_pool(tokens: Vec<Vec<f32>>) -> Vec<f32> {
    let Some(width) = tokens.first().map(Vec::len) else {
        return Vec::new();
    };
    let mut sum = vec![0.0f32; width];
    for token in &tokens {
        for (acc, value) in sum.iter_mut().zip(token) {
            *acc += value;
        }
    }
    let count = tokens.len() as f32;
    sum.iter_mut().for_each(|value| *value /= count);
    sum
}
