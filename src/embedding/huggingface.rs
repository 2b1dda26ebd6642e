//! Hugging Face feature-extraction embeddings.

use super::Embedder;
use crate::error::{ArbitroError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Model loading on the hosted pipeline can take a while on a cold start.
const EMBED_TIMEOUT_SECS: u64 = 120;
const BATCH_SIZE: usize = 32;
const MAX_CONCURRENT_BATCHES: usize = 4;

/// Pipeline output: pooled sentence vectors, or per-token vectors for
/// models without a pooling layer.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureOutput {
    Pooled(Vec<Vec<f32>>),
    Tokens(Vec<Vec<Vec<f32>>>),
}

impl FeatureOutput {
    fn into_sentence_vectors(self) -> Vec<Vec<f32>> {
        match self {
            FeatureOutput::Pooled(vectors) => vectors,
            FeatureOutput::Tokens(per_text) => per_text.into_iter().map(mean_pool).collect(),
        }
    }
}

fn mean_pool(tokens: Vec<Vec<f32>>) -> Vec<f32> {
    let Some(width) = tokens.first().map(Vec::len) else {
        return Vec::new();
    };
    let mut sum = vec![0.0f32; width];
    for token in &tokens {
        for (acc, value) in sum.iter_mut().zip(token) {
            *acc += value;
        }
    }
    let count = tokens.len() as f32;
    sum.iter_mut().for_each(|v| *v /= count);
    sum
}

/// Embedder backed by the hosted feature-extraction pipeline.
pub struct HuggingFaceEmbedder {
    client: reqwest::Client,
    endpoint: Url,
    token: String,
    dimensions: usize,
}

impl HuggingFaceEmbedder {
    /// `POST {base_url}/pipeline/feature-extraction/{model}`.
    pub fn new(base_url: &str, model: &str, token: &str, dimensions: usize) -> Result<Self> {
        let endpoint = Url::parse(&format!(
            "{}/pipeline/feature-extraction/{}",
            base_url.trim_end_matches('/'),
            model
        ))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(EMBED_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            token: token.to_string(),
            dimensions,
        })
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&json!({
                "inputs": texts,
                "options": { "wait_for_model": true },
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArbitroError::Embedding(format!(
                "feature-extraction returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let output: FeatureOutput = response.json().await.map_err(|e| {
            ArbitroError::Embedding(format!("unexpected feature-extraction output: {}", e))
        })?;
        let vectors = output.into_sentence_vectors();

        if vectors.len() != texts.len() {
            return Err(ArbitroError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ArbitroError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // `buffered` keeps batch order, so vectors line up with `texts`.
        let requests: Vec<_> = texts
            .chunks(BATCH_SIZE)
            .map(|batch| self.request(batch))
            .collect();
        let batches: Vec<Vec<Vec<f32>>> = stream::iter(requests)
            .buffered(MAX_CONCURRENT_BATCHES)
            .try_collect()
            .await?;
        let all_embeddings: Vec<Vec<f32>> = batches.into_iter().flatten().collect();
        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
