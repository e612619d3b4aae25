//! Prompt template rendering.

use crate::document::Chunk;
use crate::error::{RagError, Result};

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

/// Default question-answering template.
pub const DEFAULT_TEMPLATE: &str = "Use the following pieces of context to answer the question at the end.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
Use three sentences maximum and keep the answer as concise as possible.
Always say \"thanks for asking!\" at the end of the answer.

{context}

Question: {question}

Helpful Answer:";

/// String template with `{context}` and `{question}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Wraps `template`, which must contain both slots.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for slot in [CONTEXT_SLOT, QUESTION_SLOT] {
            if !template.contains(slot) {
                return Err(RagError::config(format!(
                    "prompt template is missing the {slot} placeholder"
                )));
            }
        }
        Ok(Self { template })
    }

    /// Raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fills the template with the chunk texts and the question.
    ///
    /// Slots are filled in one pass, so placeholder text inside a chunk or the question is
    /// left as is.
    pub fn render(&self, chunks: &[Chunk], question: &str) -> String {
        let context = join_context(chunks);
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();
        while let Some((idx, slot)) = next_slot(rest) {
            out.push_str(&rest[..idx]);
            out.push_str(if slot == CONTEXT_SLOT { context.as_str() } else { question });
            rest = &rest[idx + slot.len()..];
        }
        out.push_str(rest);
        out
    }
}

/// Chunk texts separated by a blank line.
pub fn join_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn next_slot(haystack: &str) -> Option<(usize, &'static str)> {
    [CONTEXT_SLOT, QUESTION_SLOT]
        .into_iter()
        .filter_map(|slot| haystack.find(slot).map(|idx| (idx, slot)))
        .min_by_key(|(idx, _)| *idx)
}
