//! Retrieved context and its prompt formatting.

use crate::vector_store::SearchResult;
use std::path::PathBuf;

/// A retrieved fragment.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    pub title: String,
    pub source: PathBuf,
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            title: result.chunk.title,
            source: result.chunk.source,
            content: result.chunk.content,
            score: result.score,
        }
    }
}

/// The context blob handed to the prompt composer, plus the fragments it
/// was built from.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub text: String,
    pub chunks: Vec<ContextChunk>,
}

impl Context {
    /// Context from a raw text blob, without fragment metadata.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            chunks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Format context chunks for inclusion in a prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[{}] {}\n{}", i + 1, chunk.title, chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format context chunks for display in the terminal.
pub fn format_context_for_display(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("{} (score: {:.2})", chunk.title, chunk.score))
        .collect::<Vec<_>>()
        .join("\n")
}
