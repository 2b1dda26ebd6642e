//! Embedding generation for semantic retrieval.

mod hashing;
mod huggingface;

pub use hashing::HashingEmbedder;
pub use huggingface::HuggingFaceEmbedder;

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Build the embedder selected in the settings.
///
/// The Hugging Face provider authenticates with the same token as the
/// inference endpoint.
pub fn create_embedder(
    settings: &EmbeddingSettings,
    hf_token: Option<&str>,
) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match settings.provider {
        EmbeddingProvider::HuggingFace => Arc::new(HuggingFaceEmbedder::new(
            &settings.base_url,
            &settings.model,
            hf_token.unwrap_or_default(),
            settings.dimensions as usize,
        )?),
        EmbeddingProvider::Hashing => {
            Arc::new(HashingEmbedder::with_dimensions(settings.dimensions as usize))
        }
    };
    Ok(embedder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_hashing_embedder() {
        let settings = EmbeddingSettings {
            provider: EmbeddingProvider::Hashing,
            dimensions: 64,
            ..Default::default()
        };
        let embedder = create_embedder(&settings, None).unwrap();
        assert_eq!(embedder.dimensions(), 64);
    }

    #[test]
    fn test_create_huggingface_embedder_rejects_bad_url() {
        let settings = EmbeddingSettings {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(create_embedder(&settings, Some("hf_token")).is_err());
    }
}
