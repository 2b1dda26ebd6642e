//! Vector store abstraction for Arbitro.
//!
//! Provides a trait-based interface so the corpus index does not depend on a
//! concrete backend.

mod memory;

pub use memory::MemoryVectorStore;

use crate::chunking::TextChunk;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A chunk stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedChunk {
    /// Unique chunk ID.
    pub id: Uuid,
    /// Source document path.
    pub source: PathBuf,
    /// Source document title.
    pub title: String,
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Order of this chunk in its document.
    pub chunk_order: i32,
    /// When this chunk was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl IndexedChunk {
    /// Create a new indexed chunk from a text chunk and its embedding.
    pub fn new(chunk: TextChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: chunk.source,
            title: chunk.title,
            content: chunk.content,
            embedding,
            chunk_order: chunk.order,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: IndexedChunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Summary information about an indexed source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    pub source: PathBuf,
    pub title: String,
    pub chunk_count: u32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk insert chunks.
    async fn upsert_batch(&self, chunks: &[IndexedChunk]) -> Result<usize>;

    /// Search for similar chunks.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// List indexed source documents.
    async fn list_sources(&self) -> Result<Vec<IndexedSource>>;

    /// Get total chunk count.
    async fn chunk_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
