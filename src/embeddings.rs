//! Embedding service seam and the records produced with it.

use serde::Serialize;

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// Maps text to a fixed-dimension vector via some embedding service.
pub trait Embedder: Send + Sync {
    /// Embeds a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds several texts, returning one vector per input in input order.
    ///
    /// Remote clients override this to send one request per batch.
    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        inputs.iter().map(|input| self.embed(input)).collect()
    }

    /// Largest batch `embed_batch` accepts.
    fn batch_size(&self) -> usize {
        1
    }
}

impl<E: Embedder + ?Sized> Embedder for std::sync::Arc<E> {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }

    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(inputs)
    }

    fn batch_size(&self) -> usize {
        (**self).batch_size()
    }
}

/// Chunk paired with its embedding, as stored in the index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedChunk {
    /// Source chunk.
    pub chunk: Chunk,
    /// Model embedding vector.
    pub embedding: Vec<f32>,
}

/// Embeds one text through `embedder`, rejecting an empty response.
pub(crate) fn embed_single(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    let mut vectors = embedder.embed_batch(&[text])?;
    let vector = vectors
        .pop()
        .ok_or_else(|| RagError::EmbeddingService("service returned no embedding".to_string()))?;
    if vector.is_empty() {
        return Err(RagError::EmbeddingService(
            "service returned an empty embedding".to_string(),
        ));
    }
    Ok(vector)
}
