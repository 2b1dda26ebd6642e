//! Paragraph-packing chunker.
//!
//! Keeps paragraphs intact where possible: consecutive paragraphs are packed
//! into a chunk until the size limit, and only paragraphs longer than the
//! limit are split into windows.

use super::window::split_windows;
use super::{into_chunks, Chunker, ChunkingConfig, TextChunk};
use crate::loader::{Document, DocumentKind};
use regex::Regex;
use std::sync::OnceLock;

/// Paragraph-based chunker.
pub struct ParagraphChunker;

impl ParagraphChunker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ParagraphChunker {
    fn default() -> Self {
        Self::new()
    }
}

fn blank_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n\s*\n").expect("valid regex"))
}

fn whitespace_run() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Paragraphs with whitespace collapsed. Slide text has one paragraph per line.
fn paragraphs(text: &str, kind: DocumentKind) -> Vec<String> {
    let raw: Vec<&str> = match kind {
        DocumentKind::Pdf => blank_line().split(text).collect(),
        DocumentKind::Slides => text.lines().collect(),
    };

    raw.into_iter()
        .map(|p| whitespace_run().replace_all(p.trim(), " ").into_owned())
        .filter(|p| !p.is_empty())
        .collect()
}

impl Chunker for ParagraphChunker {
    fn chunk(&self, document: &Document, config: &ChunkingConfig) -> Vec<TextChunk> {
        let limit = config.chunk_chars.max(1);
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for paragraph in paragraphs(&document.text, document.kind) {
            let len = paragraph.chars().count();

            if len > limit {
                if !current.is_empty() {
                    pieces.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                pieces.extend(split_windows(&paragraph, limit, config.overlap_chars));
                continue;
            }

            if !current.is_empty() && current_len + 2 + len > limit {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if !current.is_empty() {
                current.push_str("\n\n");
                current_len += 2;
            }
            current.push_str(&paragraph);
            current_len += len;
        }

        if !current.is_empty() {
            pieces.push(current);
        }

        into_chunks(document, pieces)
    }
}
