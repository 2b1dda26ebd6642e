//! Chunking strategies for breaking extracted documents into retrievable fragments.

mod paragraph;
mod window;

pub use paragraph::ParagraphChunker;
pub use window::WindowChunker;

use crate::config::ChunkingSettings;
use crate::loader::Document;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A fragment of a source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChunk {
    /// Title of the source document.
    pub title: String,
    /// Path of the source document.
    pub source: PathBuf,
    /// Text content of this chunk.
    pub content: String,
    /// Order of this chunk in its document.
    pub order: i32,
}

/// Chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// Pack whole paragraphs up to the size limit.
    Paragraph,
    /// Fixed-size overlapping character windows.
    Window,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "paragraph" => Ok(ChunkingStrategy::Paragraph),
            "window" | "fixed" => Ok(ChunkingStrategy::Window),
            _ => Err(format!("Unknown chunking strategy: {}", s)),
        }
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in characters.
    pub chunk_chars: usize,
    /// Characters repeated at the start of the next window.
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_chars: 1_200,
            overlap_chars: 150,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            chunk_chars: settings.chunk_chars.max(1),
            overlap_chars: settings.overlap_chars,
        }
    }
}

/// Trait for document chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    fn chunk(&self, document: &Document, config: &ChunkingConfig) -> Vec<TextChunk>;
}

/// Create a chunker based on the strategy.
pub fn create_chunker(strategy: ChunkingStrategy) -> Box<dyn Chunker> {
    match strategy {
        ChunkingStrategy::Paragraph => Box::new(ParagraphChunker::new()),
        ChunkingStrategy::Window => Box::new(WindowChunker::new()),
    }
}

/// Build chunks for a document from a list of text pieces.
pub(crate) fn into_chunks(document: &Document, pieces: Vec<String>) -> Vec<TextChunk> {
    let title = document.title();
    pieces
        .into_iter()
        .enumerate()
        .map(|(order, content)| TextChunk {
            title: title.clone(),
            source: document.source.clone(),
            content,
            order: order as i32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse() {
        assert_eq!("Paragraph".parse::<ChunkingStrategy>().unwrap(), ChunkingStrategy::Paragraph);
        assert_eq!("fixed".parse::<ChunkingStrategy>().unwrap(), ChunkingStrategy::Window);
        assert!("semantic".parse::<ChunkingStrategy>().is_err());
    }

    #[test]
    fn test_config_from_settings_never_zero() {
        let settings = ChunkingSettings {
            strategy: "window".to_string(),
            chunk_chars: 0,
            overlap_chars: 10,
        };
        let config = ChunkingConfig::from(&settings);
        assert_eq!(config.chunk_chars, 1);
    }
}
