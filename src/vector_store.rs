//! In-memory vector index with brute-force cosine search.

use serde::Serialize;
use tracing::{debug, info};

use crate::document::Chunk;
use crate::embeddings::{Embedder, IndexedChunk};
use crate::error::{RagError, Result};

/// Chunk returned by a search together with its cosine similarity.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    /// Matched chunk.
    pub chunk: Chunk,
    /// Cosine similarity against the query vector.
    pub score: f32,
}

/// Fixed set of embedded chunks, read-only once built.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
    dimension: usize,
}

impl VectorIndex {
    /// Embeds every chunk in batches and stores the pairs in insertion order.
    ///
    /// Any embedding failure aborts the build; no partial index is returned.
    pub fn build(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self> {
        let batch_size = embedder.batch_size().max(1);
        let mut entries = Vec::with_capacity(chunks.len());
        let mut chunks = chunks.into_iter().peekable();
        while chunks.peek().is_some() {
            let batch: Vec<Chunk> = chunks.by_ref().take(batch_size).collect();
            let inputs: Vec<&str> = batch.iter().map(|chunk| chunk.text.as_str()).collect();
            let vectors = embedder.embed_batch(&inputs)?;
            if vectors.len() != batch.len() {
                return Err(RagError::EmbeddingService(format!(
                    "received {} embeddings for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }
            entries.extend(
                batch
                    .into_iter()
                    .zip(vectors)
                    .map(|(chunk, embedding)| IndexedChunk { chunk, embedding }),
            );
            debug!(embedded = entries.len(), "embedded chunk batch");
        }
        let index = Self::from_entries(entries)?;
        info!(
            chunks = index.len(),
            dimension = index.dimension,
            "built vector index"
        );
        Ok(index)
    }

    /// Wraps pre-computed entries; every vector must share one dimension.
    pub fn from_entries(entries: Vec<IndexedChunk>) -> Result<Self> {
        let dimension = entries.first().map_or(0, |entry| entry.embedding.len());
        if let Some(bad) = entries
            .iter()
            .find(|entry| entry.embedding.len() != dimension || entry.embedding.is_empty())
        {
            return Err(RagError::EmbeddingService(format!(
                "embedding for {} at offset {} has dimension {}, expected {}",
                bad.chunk.metadata.source_url,
                bad.chunk.metadata.start_offset,
                bad.embedding.len(),
                dimension
            )));
        }
        Ok(Self { entries, dimension })
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension shared by every stored vector (0 when empty).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Stored entries in insertion order.
    pub fn entries(&self) -> &[IndexedChunk] {
        &self.entries
    }

    /// Returns the `k` entries most similar to `query`, best first.
    ///
    /// Equal scores keep insertion order.
    pub fn search_by_vector(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (idx, cosine_similarity(query, &entry.embedding)))
            .collect();
        // stable sort keeps insertion order among ties
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
            .into_iter()
            .take(k)
            .map(|(idx, score)| ScoredChunk {
                chunk: self.entries[idx].chunk.clone(),
                score,
            })
            .collect()
    }

    /// Embeds `query` and returns the `k` most similar chunks.
    pub fn search(&self, query: &str, k: usize, embedder: &dyn Embedder) -> Result<Vec<ScoredChunk>> {
        let vector = embedder.embed(query)?;
        if !self.is_empty() && vector.len() != self.dimension {
            return Err(RagError::EmbeddingService(format!(
                "query embedding has dimension {}, index expects {}",
                vector.len(),
                self.dimension
            )));
        }
        Ok(self.search_by_vector(&vector, k))
    }
}

/// Cosine similarity; mismatched lengths, zero vectors and non-finite results score 0.
///
/// Sums are accumulated in `f64` so large components do not overflow.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let score = (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32;
    if score.is_finite() {
        score
    } else {
        0.0
    }
}
