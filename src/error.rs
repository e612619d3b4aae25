//! Error taxonomy shared by every pipeline stage.

use thiserror::Error;

/// Convenience alias used across the library.
pub type Result<T, E = RagError> = std::result::Result<T, E>;

/// Failures surfaced while building the index or answering a question.
///
/// None of these are retried; each aborts the build or query that raised it.
#[derive(Debug, Error)]
pub enum RagError {
    /// A source page was unreachable or returned a non-success status.
    #[error("failed to fetch {url}: {message}")]
    Fetch {
        /// Page that could not be loaded.
        url: String,
        /// Transport or status detail.
        message: String,
    },
    /// The remote embedding service failed or returned an unusable payload.
    #[error("embedding service error: {0}")]
    EmbeddingService(String),
    /// The remote generation service failed or returned an unusable payload.
    #[error("generation service error: {0}")]
    GenerationService(String),
    /// Required configuration was missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RagError {
    pub(crate) fn fetch(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
