//! Startup configuration shared by the binaries.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, ValueEnum};
use url::Url;

use crate::embedder::{self, HuggingFaceEmbedder, OpenAiEmbedder};
use crate::embeddings::Embedder;
use crate::error::{RagError, Result};
use crate::llm::{self, GenerationParams, HuggingFaceProvider, LlmProvider, OpenAiProvider};
use crate::prompt::PromptTemplate;
use crate::retriever::DEFAULT_TOP_K;
use crate::splitter::SplitterConfig;

/// Python FAQ pages indexed when no `--url` is given.
pub const PYTHON_FAQ_URLS: [&str; 8] = [
    "https://docs.python.org/3/faq/general.html",
    "https://docs.python.org/3/faq/programming.html",
    "https://docs.python.org/3/faq/design.html",
    "https://docs.python.org/3/faq/library.html",
    "https://docs.python.org/3/faq/extending.html",
    "https://docs.python.org/3/faq/windows.html",
    "https://docs.python.org/3/faq/gui.html",
    "https://docs.python.org/3/faq/installed.html",
];

/// Default sentence-embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-mpnet-base-v2";
/// Default hosted generation model.
pub const DEFAULT_GENERATION_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.3";

const HF_TOKEN_ENV: &str = "HUGGINGFACEHUB_API_TOKEN";
const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Remote service family used for a stage.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Provider {
    /// Hugging Face hosted inference.
    #[value(name = "huggingface")]
    HuggingFace,
    /// OpenAI-compatible API.
    #[value(name = "openai")]
    OpenAi,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HuggingFace => write!(f, "huggingface"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

/// Credential that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Raw token value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// Embedding service settings.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Service family.
    pub provider: Provider,
    /// Model identifier.
    pub model: String,
    /// API base URL.
    pub base_url: String,
    /// Bearer credential.
    pub api_token: ApiToken,
    /// Max inputs per request.
    pub batch_size: usize,
    /// Optional output dimension (OpenAI only).
    pub dimensions: Option<usize>,
}

impl EmbeddingConfig {
    /// Connects the configured embedding client.
    pub fn connect(&self, timeout: Duration) -> Result<Arc<dyn Embedder>> {
        let token = self.api_token.expose();
        Ok(match self.provider {
            Provider::HuggingFace => Arc::new(HuggingFaceEmbedder::new(
                token,
                &self.base_url,
                &self.model,
                timeout,
                self.batch_size,
            )?),
            Provider::OpenAi => Arc::new(OpenAiEmbedder::new(
                token,
                &self.base_url,
                &self.model,
                self.dimensions,
                timeout,
                self.batch_size,
            )?),
        })
    }
}

/// Generation service settings.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Service family.
    pub provider: Provider,
    /// Model identifier.
    pub model: String,
    /// API base URL.
    pub base_url: String,
    /// Bearer credential.
    pub api_token: ApiToken,
    /// Sampling parameters.
    pub params: GenerationParams,
}

impl GenerationConfig {
    /// Connects the configured generation client.
    pub fn connect(&self, timeout: Duration) -> Result<Arc<dyn LlmProvider>> {
        let token = self.api_token.expose();
        Ok(match self.provider {
            Provider::HuggingFace => Arc::new(HuggingFaceProvider::new(
                token,
                &self.base_url,
                &self.model,
                self.params,
                timeout,
            )?),
            Provider::OpenAi => Arc::new(OpenAiProvider::new(
                token,
                &self.base_url,
                &self.model,
                self.params,
                timeout,
            )?),
        })
    }
}

/// Validated configuration, built once at startup and handed to each stage.
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Pages to index, in order.
    pub urls: Vec<Url>,
    /// CSS selector of the HTML region kept from each page.
    pub region_selector: String,
    /// Chunking parameters.
    pub splitter: SplitterConfig,
    /// Embedding service.
    pub embedding: EmbeddingConfig,
    /// Generation service.
    pub generation: GenerationConfig,
    /// Chunks retrieved per question.
    pub top_k: usize,
    /// Prompt template.
    pub prompt: PromptTemplate,
    /// Timeout applied to every remote request.
    pub request_timeout: Duration,
}

/// Command-line flags (with environment fallbacks) that produce a [`RagConfig`].
#[derive(Args, Debug, Clone)]
pub struct RagArgs {
    /// Page to index; repeat or comma separate (defaults to the Python FAQ pages)
    #[arg(long = "url", env = "PYFAQ_URLS", value_delimiter = ',')]
    pub urls: Vec<Url>,

    /// CSS selector of the page region to keep
    #[arg(long, env = "PYFAQ_REGION", default_value = ".body")]
    pub region: String,

    /// Maximum characters per chunk
    #[arg(long, env = "PYFAQ_CHUNK_SIZE", default_value_t = 1000)]
    pub chunk_size: usize,

    /// Characters shared by adjacent chunks
    #[arg(long, env = "PYFAQ_CHUNK_OVERLAP", default_value_t = 200)]
    pub chunk_overlap: usize,

    /// Embedding service provider
    #[arg(long, env = "PYFAQ_EMBEDDING_PROVIDER", value_enum, default_value_t = Provider::HuggingFace)]
    pub embedding_provider: Provider,

    /// Embedding model identifier
    #[arg(long, env = "PYFAQ_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    /// Embedding API base URL (defaults to the provider's public endpoint)
    #[arg(long, env = "PYFAQ_EMBEDDING_BASE")]
    pub embedding_base_url: Option<String>,

    /// Max chunks sent per embedding request
    #[arg(long, env = "PYFAQ_EMBEDDING_BATCH", default_value_t = 32)]
    pub embedding_batch: usize,

    /// Optional embedding dimension override (OpenAI only)
    #[arg(long, env = "PYFAQ_EMBEDDING_DIMENSIONS")]
    pub embedding_dimensions: Option<usize>,

    /// Generation service provider
    #[arg(long, env = "PYFAQ_LLM_PROVIDER", value_enum, default_value_t = Provider::HuggingFace)]
    pub llm_provider: Provider,

    /// Generation model identifier
    #[arg(long, env = "PYFAQ_LLM_MODEL", default_value = DEFAULT_GENERATION_MODEL)]
    pub llm_model: String,

    /// Generation API base URL (defaults to the provider's public endpoint)
    #[arg(long, env = "PYFAQ_LLM_BASE")]
    pub llm_base_url: Option<String>,

    /// Sampling temperature
    #[arg(long, env = "PYFAQ_TEMPERATURE", default_value_t = 0.3)]
    pub temperature: f32,

    /// Maximum tokens generated per answer
    #[arg(long, env = "PYFAQ_MAX_NEW_TOKENS", default_value_t = 200)]
    pub max_new_tokens: usize,

    /// Chunks retrieved per question
    #[arg(long, env = "PYFAQ_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// File holding a custom prompt template with {context} and {question}
    #[arg(long, env = "PYFAQ_PROMPT_TEMPLATE")]
    pub prompt_template: Option<PathBuf>,

    /// Seconds before any remote request times out
    #[arg(long, env = "PYFAQ_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    /// Hugging Face API token
    #[arg(long, env = HF_TOKEN_ENV, hide_env_values = true)]
    pub hf_api_token: Option<String>,

    /// OpenAI API key
    #[arg(long, env = OPENAI_KEY_ENV, hide_env_values = true)]
    pub openai_api_key: Option<String>,
}

impl RagArgs {
    /// Validates the flags and resolves provider defaults and credentials.
    pub fn build_config(&self) -> Result<RagConfig> {
        let urls = if self.urls.is_empty() {
            PYTHON_FAQ_URLS
                .iter()
                .map(|raw| Url::parse(raw).map_err(|err| RagError::config(format!("{raw}: {err}"))))
                .collect::<Result<Vec<_>>>()?
        } else {
            self.urls.clone()
        };
        if let Some(bad) = urls.iter().find(|url| !matches!(url.scheme(), "http" | "https")) {
            return Err(RagError::config(format!("unsupported URL scheme in {bad}")));
        }

        let splitter = SplitterConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            ..SplitterConfig::default()
        };
        splitter.validate()?;

        let prompt = match &self.prompt_template {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|err| {
                    RagError::config(format!("failed to read prompt template {path:?}: {err}"))
                })?;
                PromptTemplate::new(text)?
            }
            None => PromptTemplate::default(),
        };

        let embedding = EmbeddingConfig {
            provider: self.embedding_provider,
            model: self.embedding_model.clone(),
            base_url: self
                .embedding_base_url
                .clone()
                .unwrap_or_else(|| default_embedding_base(self.embedding_provider).to_string()),
            api_token: self.token_for(self.embedding_provider, "embedding")?,
            batch_size: self.embedding_batch.max(1),
            dimensions: self.embedding_dimensions,
        };
        let generation = GenerationConfig {
            provider: self.llm_provider,
            model: self.llm_model.clone(),
            base_url: self
                .llm_base_url
                .clone()
                .unwrap_or_else(|| default_generation_base(self.llm_provider).to_string()),
            api_token: self.token_for(self.llm_provider, "generation")?,
            params: GenerationParams {
                temperature: self.temperature,
                max_new_tokens: self.max_new_tokens.max(1),
                return_full_text: false,
            },
        };

        Ok(RagConfig {
            urls,
            region_selector: self.region.clone(),
            splitter,
            embedding,
            generation,
            top_k: self.top_k.max(1),
            prompt,
            request_timeout: Duration::from_secs(self.timeout_secs.max(1)),
        })
    }

    fn token_for(&self, provider: Provider, stage: &str) -> Result<ApiToken> {
        let (value, env) = match provider {
            Provider::HuggingFace => (&self.hf_api_token, HF_TOKEN_ENV),
            Provider::OpenAi => (&self.openai_api_key, OPENAI_KEY_ENV),
        };
        value
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| ApiToken(token.to_string()))
            .ok_or_else(|| {
                RagError::config(format!(
                    "{env} must be set for the {provider} {stage} provider"
                ))
            })
    }
}

fn default_embedding_base(provider: Provider) -> &'static str {
    match provider {
        Provider::HuggingFace => embedder::huggingface::DEFAULT_BASE_URL,
        Provider::OpenAi => embedder::openai::DEFAULT_BASE_URL,
    }
}

fn default_generation_base(provider: Provider) -> &'static str {
    match provider {
        Provider::HuggingFace => llm::huggingface::DEFAULT_BASE_URL,
        Provider::OpenAi => llm::openai::DEFAULT_BASE_URL,
    }
}
