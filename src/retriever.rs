//! Top-K retrieval over a built index.

use tracing::debug;

use crate::embeddings::Embedder;
use crate::error::Result;
use crate::vector_store::{ScoredChunk, VectorIndex};

/// Number of chunks retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 6;

/// Stateless view pairing an index with the embedder that built it.
#[derive(Clone, Copy)]
pub struct Retriever<'a> {
    index: &'a VectorIndex,
    embedder: &'a dyn Embedder,
    top_k: usize,
}

impl<'a> Retriever<'a> {
    /// Builds a retriever returning at most `top_k` chunks per query.
    pub fn new(index: &'a VectorIndex, embedder: &'a dyn Embedder, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k: top_k.max(1),
        }
    }

    /// Configured result count.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Returns up to `top_k` chunks ranked by descending similarity to `query`.
    pub fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        let hits = self.index.search(query, self.top_k, self.embedder)?;
        debug!(
            hits = hits.len(),
            best = hits.first().map(|hit| hit.score),
            "retrieved chunks"
        );
        Ok(hits)
    }
}
