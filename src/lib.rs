#![warn(missing_docs)]
//! Retrieval-augmented question answering over the Python FAQ pages.

pub mod config;
pub mod document;
pub mod embedder;
pub mod embeddings;
pub mod error;
pub mod llm;
pub mod loader;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod splitter;
#[cfg(test)]
mod stub_http;
pub mod vector_store;
pub mod web;

pub use config::{Provider, RagArgs, RagConfig};
pub use document::{Chunk, ChunkMetadata, SourceDocument, SourceMetadata};
pub use embeddings::{Embedder, IndexedChunk};
pub use error::{RagError, Result};
pub use llm::{GenerationParams, LlmProvider};
pub use pipeline::{Answer, QuestionAnswerer, RagPipeline};
pub use prompt::PromptTemplate;
pub use retriever::Retriever;
pub use splitter::{SplitterConfig, TextSplitter};
pub use vector_store::{ScoredChunk, VectorIndex};
