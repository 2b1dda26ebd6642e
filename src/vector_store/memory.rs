//! In-memory vector store implementation.
//!
//! Holds the whole corpus for the lifetime of the process. Writes only happen
//! while the index is being built; afterwards every access is a read.

use super::{cosine_similarity, IndexedChunk, IndexedSource, SearchResult, VectorStore};
use crate::error::{ArbitroError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    chunks: RwLock<Vec<IndexedChunk>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<IndexedChunk>>> {
        self.chunks
            .read()
            .map_err(|_| ArbitroError::VectorStore("store lock poisoned".to_string()))
    }

    /// Snapshot of every stored chunk, in insertion order.
    pub fn snapshot(&self) -> Result<Vec<IndexedChunk>> {
        Ok(self.read()?.clone())
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, chunks: &[IndexedChunk]) -> Result<usize> {
        let mut store = self
            .chunks
            .write()
            .map_err(|_| ArbitroError::VectorStore("store lock poisoned".to_string()))?;
        for chunk in chunks {
            match store.iter_mut().find(|c| c.id == chunk.id) {
                Some(existing) => *existing = chunk.clone(),
                None => store.push(chunk.clone()),
            }
        }
        Ok(chunks.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, f32::MIN).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let chunks = self.read()?;

        let mut results: Vec<SearchResult> = chunks
            .iter()
            .map(|chunk| SearchResult {
                chunk: chunk.clone(),
                score: cosine_similarity(query_embedding, &chunk.embedding),
            })
            .filter(|r| r.score >= min_score)
            .collect();

        // Stable sort: equal scores keep insertion order, so results are reproducible.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let chunks = self.read()?;

        let mut sources: BTreeMap<std::path::PathBuf, IndexedSource> = BTreeMap::new();
        for chunk in chunks.iter() {
            sources
                .entry(chunk.source.clone())
                .or_insert_with(|| IndexedSource {
                    source: chunk.source.clone(),
                    title: chunk.title.clone(),
                    chunk_count: 0,
                })
                .chunk_count += 1;
        }

        Ok(sources.into_values().collect())
    }

    async fn chunk_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
