//! Overlapping character-window splitter with a boundary fallback cascade.
//!
//! Each window is at most `chunk_size` characters long. Its end is placed right after the
//! last occurrence of the coarsest separator found inside the window; when the coarsest
//! separator does not occur the search recurses into the next finer one, and when every
//! separator is exhausted the window is cut at exactly `chunk_size`. The following window
//! starts `chunk_overlap` characters before the previous end, so adjacent chunks always
//! share exactly that many characters.

use tracing::{debug, info};

use crate::document::{Chunk, SourceDocument};
use crate::error::{RagError, Result};

/// Splitter tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitterConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared by adjacent chunks of the same document.
    pub chunk_overlap: usize,
    /// Preferred boundaries, coarsest first.
    pub separators: Vec<String>,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: vec!["\n\n".to_string(), "\n".to_string(), " ".to_string()],
        }
    }
}

impl SplitterConfig {
    /// Checks that the window and overlap sizes leave room for progress.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::config("chunk size must be greater than zero"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::config(format!(
                "chunk overlap {} must be smaller than chunk size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.separators.iter().any(|sep| sep.is_empty()) {
            return Err(RagError::config("separators must not be empty strings"));
        }
        Ok(())
    }
}

/// Splits documents into overlapping chunks.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    /// Builds a splitter after validating `config`.
    pub fn new(config: SplitterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Splits every document, keeping document order and in-document order.
    pub fn split_documents(&self, documents: &[SourceDocument]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for document in documents {
            let before = chunks.len();
            chunks.extend(self.split_document(document));
            debug!(
                url = %document.metadata.source_url,
                chunks = chunks.len() - before,
                "split document"
            );
        }
        info!(
            documents = documents.len(),
            chunks = chunks.len(),
            chunk_size = self.config.chunk_size,
            chunk_overlap = self.config.chunk_overlap,
            "split documents into chunks"
        );
        chunks
    }

    /// Splits one document. An empty or whitespace-only document produces no chunks.
    pub fn split_document(&self, document: &SourceDocument) -> Vec<Chunk> {
        let url = document.metadata.source_url.as_str();
        self.split_text(&document.text)
            .into_iter()
            .map(|(start, text)| Chunk::new(url, start, text))
            .collect()
    }

    /// Splits raw text into `(start_offset, window)` pairs, offsets counted in characters.
    pub fn split_text<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Byte position of every character, plus the end of the text.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(idx, _)| idx)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = bounds.len() - 1;
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut windows = Vec::new();
        let mut start = 0usize;
        loop {
            if total - start <= size {
                windows.push((start, &text[bounds[start]..]));
                break;
            }
            let limit = start + size;
            let end = find_break(text, &bounds, start + overlap, limit, &self.config.separators);
            windows.push((start, &text[bounds[start]..bounds[end]]));
            start = end - overlap;
        }
        windows
    }
}

/// Picks the character index ending the current window.
///
/// The result lies in `(floor, limit]`, so the next window, which starts `overlap`
/// characters before it, always begins after the current one.
fn find_break(
    text: &str,
    bounds: &[usize],
    floor: usize,
    limit: usize,
    separators: &[String],
) -> usize {
    let Some((separator, finer)) = separators.split_first() else {
        return limit;
    };
    let window = &text[bounds[floor]..bounds[limit]];
    match window.rfind(separator.as_str()) {
        Some(pos) => {
            let byte_end = bounds[floor] + pos + separator.len();
            bounds
                .binary_search(&byte_end)
                .unwrap_or_else(|insert_at| insert_at)
        }
        None => find_break(text, bounds, floor, limit, finer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn splitter(chunk_size: usize, chunk_overlap: usize) -> TextSplitter {
        TextSplitter::new(SplitterConfig {
            chunk_size,
            chunk_overlap,
            ..SplitterConfig::default()
        })
        .unwrap()
    }

    fn reconstruct(chunks: &[(usize, &str)], overlap: usize) -> String {
        let mut out = String::new();
        for (idx, (_, text)) in chunks.iter().enumerate() {
            if idx == 0 {
                out.push_str(text);
            } else {
                out.extend(text.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn short_document_is_a_single_chunk() {
        let doc = SourceDocument::new(
            "https://example.com",
            "Python is a programming language. It is widely used.",
        );
        let chunks = TextSplitter::new(SplitterConfig::default())
            .unwrap()
            .split_document(&doc);

        assert_eq!(chunks, vec![Chunk::new("https://example.com", 0, doc.text.clone())]);
    }

    #[test]
    fn empty_document_has_no_chunks() {
        for text in ["", " \n\n "] {
            let doc = SourceDocument::new("https://example.com", text);
            assert!(splitter(10, 2).split_document(&doc).is_empty());
        }
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let text = "aaaa aaaa aaaa\n\nbbbb bbbb bbbb\n\ncccc cccc cccc";
        let chunks = splitter(30, 5).split_text(text);

        assert_eq!(
            chunks,
            vec![
                (0, "aaaa aaaa aaaa\n\n"),
                (11, "aaa\n\nbbbb bbbb bbbb\n\n"),
                (27, "bbb\n\ncccc cccc cccc"),
            ]
        );
    }

    #[test]
    fn falls_back_to_spaces_before_hard_split() {
        let text = "one two three four five six seven eight";
        let chunks = splitter(12, 2).split_text(text);

        assert!(chunks.iter().all(|(_, chunk)| chunk.chars().count() <= 12));
        assert!(chunks[..chunks.len() - 1]
            .iter()
            .all(|(_, chunk)| chunk.ends_with(' ')));
        assert_eq!(reconstruct(&chunks, 2), text);
    }

    #[test]
    fn hard_splits_when_no_separator_matches() {
        let text = "abcdefghij".repeat(5);
        let chunks = splitter(20, 5).split_text(&text);

        let offsets: Vec<usize> = chunks.iter().map(|(start, _)| *start).collect();
        assert_eq!(offsets, vec![0, 15, 30]);
        assert!(chunks.iter().all(|(_, chunk)| chunk.len() == 20));
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let text = "é".repeat(25);
        let chunks = splitter(10, 3).split_text(&text);

        let offsets: Vec<usize> = chunks.iter().map(|(start, _)| *start).collect();
        assert_eq!(offsets, vec![0, 7, 14, 21]);
        assert_eq!(chunks[0].1.chars().count(), 10);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        let err = TextSplitter::new(SplitterConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..SplitterConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, RagError::Configuration(_)));
    }

    fn size_and_overlap() -> impl Strategy<Value = (usize, usize)> {
        (8usize..160).prop_flat_map(|size| (Just(size), 0..size))
    }

    proptest! {
        #[test]
        fn proptest_windows_tile_the_text(
            text in "[a-zé .\n]{0,1200}",
            (size, overlap) in size_and_overlap(),
        ) {
            let chunks = splitter(size, overlap).split_text(&text);
            let total = text.chars().count();

            if text.trim().is_empty() {
                prop_assert!(chunks.is_empty());
            } else {
                prop_assert_eq!(chunks[0].0, 0);
                prop_assert_eq!(reconstruct(&chunks, overlap), text.clone());
            }
            if !text.trim().is_empty() && total <= size {
                prop_assert_eq!(chunks.len(), 1);
            }
            for (start, chunk) in &chunks {
                let len = chunk.chars().count();
                prop_assert!(len <= size);
                prop_assert!(start + len <= total);
            }
            for pair in chunks.windows(2) {
                let (prev_start, prev) = pair[0];
                let (next_start, next) = pair[1];
                let prev_end = prev_start + prev.chars().count();
                prop_assert_eq!(next_start + overlap, prev_end);
                let tail: String = prev.chars().skip(prev.chars().count() - overlap).collect();
                let head: String = next.chars().take(overlap).collect();
                prop_assert_eq!(tail, head);
            }
        }
    }
}
