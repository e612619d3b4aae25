//! Document and chunk records passed between pipeline stages.

use serde::Serialize;

/// Metadata captured for a loaded page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMetadata {
    /// URL the page was fetched from.
    pub source_url: String,
    /// Text of the page `<title>`, when present.
    pub title: Option<String>,
    /// Value of the `<html lang>` attribute, when present.
    pub language: Option<String>,
}

impl SourceMetadata {
    /// Metadata carrying only the source URL.
    pub fn from_url(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            title: None,
            language: None,
        }
    }
}

/// Cleaned text of one fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDocument {
    /// Extracted region text.
    pub text: String,
    /// Page-level metadata.
    pub metadata: SourceMetadata,
}

impl SourceDocument {
    /// Builds a document for `source_url` with no title or language.
    pub fn new(source_url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: SourceMetadata::from_url(source_url),
        }
    }

    /// Length of the document in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Provenance of a chunk within its document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkMetadata {
    /// URL of the owning document.
    pub source_url: String,
    /// Character offset of the chunk's first character in the owning document.
    pub start_offset: usize,
}

/// Bounded window of document text; the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Window text.
    pub text: String,
    /// Where the window came from.
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Builds a chunk starting at `start_offset` characters into `source_url`.
    pub fn new(source_url: impl Into<String>, start_offset: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: ChunkMetadata {
                source_url: source_url.into(),
                start_offset,
            },
        }
    }

    /// Length of the chunk in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
