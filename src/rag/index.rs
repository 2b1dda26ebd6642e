//! The corpus index: built once from the loaded documents, read-only afterwards.

use super::context::{
    format_context_for_display, format_context_for_prompt, Context, ContextChunk,
};
use crate::chunking::{Chunker, ChunkingConfig, TextChunk};
use crate::config::RetrievalSettings;
use crate::embedding::Embedder;
use crate::error::{ArbitroError, Result};
use crate::loader::Document;
use crate::vector_store::{IndexedChunk, IndexedSource, MemoryVectorStore, VectorStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Anything that can turn a question into a context blob.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, question: &str) -> Result<Context>;
}

/// Immutable retrieval index over the regulation corpus.
///
/// There is no method that writes to the store after [`CorpusIndex::build`]
/// returns, so the index can be shared behind an `Arc` and queried
/// concurrently.
pub struct CorpusIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_chunks: usize,
    min_score: f32,
}

impl std::fmt::Debug for CorpusIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusIndex")
            .field("max_chunks", &self.max_chunks)
            .field("min_score", &self.min_score)
            .finish_non_exhaustive()
    }
}

impl CorpusIndex {
    /// Chunk, embed and store every document in a fresh in-memory store.
    pub async fn build(
        documents: Vec<Document>,
        chunker: &dyn Chunker,
        chunking: &ChunkingConfig,
        embedder: Arc<dyn Embedder>,
        retrieval: &RetrievalSettings,
    ) -> Result<Self> {
        Self::build_with_store(
            documents,
            chunker,
            chunking,
            embedder,
            Arc::new(MemoryVectorStore::new()),
            retrieval,
        )
        .await
    }

    /// Same as [`CorpusIndex::build`] with a caller-provided store.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub async fn build_with_store(
        documents: Vec<Document>,
        chunker: &dyn Chunker,
        chunking: &ChunkingConfig,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        retrieval: &RetrievalSettings,
    ) -> Result<Self> {
        if documents.is_empty() {
            warn!("Building an empty index: no documents were loaded");
        }

        let chunks: Vec<TextChunk> = documents
            .iter()
            .flat_map(|doc| chunker.chunk(doc, chunking))
            .collect();
        debug!("Split {} documents into {} chunks", documents.len(), chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        let indexed: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk::new(chunk, embedding))
            .collect();
        let count = store.upsert_batch(&indexed).await?;

        info!("Indexed {} chunks from {} documents", count, documents.len());

        Ok(Self {
            store,
            embedder,
            max_chunks: retrieval.max_context_chunks,
            min_score: retrieval.min_score,
        })
    }

    /// Retrieve the context for a question.
    ///
    /// An out-of-corpus question yields an empty or low-relevance context;
    /// that is not an error. Embedding or store failures surface as
    /// [`ArbitroError::Retrieval`].
    #[instrument(skip(self), fields(question = %question))]
    pub async fn query(&self, question: &str) -> Result<Context> {
        let query_embedding = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| ArbitroError::Retrieval(format!("embedding the question: {}", e)))?;

        let results = self
            .store
            .search_with_threshold(&query_embedding, self.max_chunks, self.min_score)
            .await
            .map_err(|e| ArbitroError::Retrieval(format!("searching the index: {}", e)))?;

        let chunks: Vec<ContextChunk> = results.into_iter().map(ContextChunk::from).collect();
        debug!(
            "Retrieved {} context chunks:\n{}",
            chunks.len(),
            format_context_for_display(&chunks)
        );

        Ok(Context {
            text: format_context_for_prompt(&chunks),
            chunks,
        })
    }

    /// Number of indexed chunks.
    pub async fn chunk_count(&self) -> Result<usize> {
        self.store.chunk_count().await
    }

    /// Indexed source documents.
    pub async fn sources(&self) -> Result<Vec<IndexedSource>> {
        self.store.list_sources().await
    }
}

#[async_trait]
impl Retriever for CorpusIndex {
    async fn retrieve(&self, question: &str) -> Result<Context> {
        self.query(question).await
    }
}
