//! Named build and query stages, composed into a question-answering pipeline.
//!
//! Build time: [`load`] -> [`split`] -> [`index`]. Query time: [`RagPipeline::retrieve`] ->
//! [`RagPipeline::assemble`] -> [`RagPipeline::generate`]. Each stage can be driven on its own
//! with fake services.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::config::RagConfig;
use crate::document::{Chunk, SourceDocument};
use crate::embeddings::Embedder;
use crate::error::Result;
use crate::llm::LlmProvider;
use crate::loader::WebLoader;
use crate::prompt::PromptTemplate;
use crate::retriever::Retriever;
use crate::splitter::TextSplitter;
use crate::vector_store::{ScoredChunk, VectorIndex};

/// Generated answer plus the chunks it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Model output.
    pub text: String,
    /// Retrieved chunks, best first.
    pub sources: Vec<ScoredChunk>,
}

/// Anything that can turn a question into an answer.
pub trait QuestionAnswerer: Send + Sync {
    /// Runs retrieval and generation for `question`.
    fn answer(&self, question: &str) -> Result<Answer>;
}

/// Load stage: fetches every configured page.
pub fn load(config: &RagConfig) -> Result<Vec<SourceDocument>> {
    let loader = WebLoader::new(&config.region_selector, config.request_timeout)?;
    loader.load(&config.urls)
}

/// Split stage: chunks every document with the configured window and overlap.
pub fn split(config: &RagConfig, documents: &[SourceDocument]) -> Result<Vec<Chunk>> {
    let splitter = TextSplitter::new(config.splitter.clone())?;
    Ok(splitter.split_documents(documents))
}

/// Index stage: embeds every chunk into a read-only index.
pub fn index(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<VectorIndex> {
    VectorIndex::build(chunks, embedder)
}

/// Built index plus the services needed to answer questions against it.
pub struct RagPipeline {
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn LlmProvider>,
    prompt: PromptTemplate,
    top_k: usize,
}

impl RagPipeline {
    /// Wraps an already built index.
    pub fn new(
        index: VectorIndex,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn LlmProvider>,
        prompt: PromptTemplate,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            generator,
            prompt,
            top_k: top_k.max(1),
        }
    }

    /// Connects the remote services named in `config`, then loads, splits and indexes.
    ///
    /// Missing credentials fail before any page is fetched.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let embedder = config.embedding.connect(config.request_timeout)?;
        let generator = config.generation.connect(config.request_timeout)?;
        let documents = load(config)?;
        Self::build(config, &documents, embedder, generator)
    }

    /// Splits and indexes `documents` with the given services.
    pub fn build(
        config: &RagConfig,
        documents: &[SourceDocument],
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let started = Instant::now();
        let chunks = split(config, documents)?;
        let index = index(chunks, embedder.as_ref())?;
        info!(
            documents = documents.len(),
            chunks = index.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline ready"
        );
        Ok(Self::new(
            index,
            embedder,
            generator,
            config.prompt.clone(),
            config.top_k,
        ))
    }

    /// The read-only index.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Retriever over the index.
    pub fn retriever(&self) -> Retriever<'_> {
        Retriever::new(&self.index, self.embedder.as_ref(), self.top_k)
    }

    /// Retrieve stage.
    pub fn retrieve(&self, question: &str) -> Result<Vec<ScoredChunk>> {
        self.retriever().retrieve(question)
    }

    /// Assemble stage.
    pub fn assemble(&self, hits: &[ScoredChunk], question: &str) -> String {
        let chunks: Vec<Chunk> = hits.iter().map(|hit| hit.chunk.clone()).collect();
        self.prompt.render(&chunks, question)
    }

    /// Generate stage.
    pub fn generate(&self, prompt: &str) -> Result<String> {
        self.generator.generate(prompt)
    }
}

impl QuestionAnswerer for RagPipeline {
    fn answer(&self, question: &str) -> Result<Answer> {
        let started = Instant::now();
        let sources = self.retrieve(question)?;
        let prompt = self.assemble(&sources, question);
        let text = self.generate(&prompt)?;
        info!(
            hits = sources.len(),
            answer_chars = text.len(),
            latency_ms = started.elapsed().as_secs_f64() * 1000.0,
            "answered question"
        );
        Ok(Answer { text, sources })
    }
}

impl<Q: QuestionAnswerer + ?Sized> QuestionAnswerer for Arc<Q> {
    fn answer(&self, question: &str) -> Result<Answer> {
        (**self).answer(question)
    }
}
