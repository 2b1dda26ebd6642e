//! Fixed-size window chunking.

use super::{into_chunks, Chunker, ChunkingConfig, TextChunk};
use crate::loader::Document;

/// Splits text into overlapping windows of roughly `chunk_chars` characters.
pub struct WindowChunker;

impl WindowChunker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for WindowChunker {
    fn chunk(&self, document: &Document, config: &ChunkingConfig) -> Vec<TextChunk> {
        let pieces = split_windows(&document.text, config.chunk_chars, config.overlap_chars);
        into_chunks(document, pieces)
    }
}

/// Split on character boundaries, preferring to cut at whitespace.
pub(crate) fn split_windows(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let size = size.max(1);
    let overlap = overlap.min(size - 1);

    let mut pieces = Vec::new();
    let mut start = 0;

    loop {
        while start < chars.len() && chars[start].is_whitespace() {
            start += 1;
        }
        if start >= chars.len() {
            break;
        }

        let mut end = (start + size).min(chars.len());
        if end < chars.len() {
            if let Some(ws) = chars[start..end].iter().rposition(|c| c.is_whitespace()) {
                if ws > 0 {
                    end = start + ws;
                }
            }
        }

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }

        if end >= chars.len() {
            break;
        }
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }

    pieces
}
