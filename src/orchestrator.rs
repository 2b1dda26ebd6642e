//! Startup wiring for Arbitro.
//!
//! Builds every long-lived component from the settings: the document corpus,
//! the retrieval index, the inference client and, for the bot, the Telegram
//! transport. Any failure here aborts startup.

use crate::bot::{BotContext, BotRunner};
use crate::chunking::{create_chunker, ChunkingConfig, ChunkingStrategy};
use crate::config::{EmbeddingProvider, Prompts, Secrets, Settings};
use crate::embedding::create_embedder;
use crate::error::{ArbitroError, Result};
use crate::inference::HfInferenceClient;
use crate::loader::{load_documents, Document};
use crate::rag::CorpusIndex;
use crate::telegram::TelegramClient;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// The main orchestrator for the Arbitro pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
}

impl Orchestrator {
    /// Create an orchestrator, loading prompt templates from the configured
    /// custom directory when present.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        Ok(Self { settings, prompts })
    }

    /// Create an orchestrator with already-loaded prompts.
    pub fn with_prompts(settings: Settings, prompts: Prompts) -> Self {
        Self { settings, prompts }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Read every supported document in the data directory.
    pub async fn load_documents(&self) -> Result<Vec<Document>> {
        let dir = self.settings.data_dir();
        info!("Loading documents from {}", dir.display());
        let documents = load_documents(&dir).await?;
        info!("Loaded {} documents", documents.len());
        Ok(documents)
    }

    /// Load, chunk and embed the corpus into a fresh index.
    ///
    /// `hf_token` is only needed by the Hugging Face embedding provider.
    #[instrument(skip_all, fields(provider = %self.settings.embedding.provider))]
    pub async fn build_index(&self, hf_token: Option<&str>) -> Result<CorpusIndex> {
        let documents = self.load_documents().await?;

        let strategy: ChunkingStrategy = self
            .settings
            .chunking
            .strategy
            .parse()
            .map_err(ArbitroError::Config)?;
        let chunker = create_chunker(strategy);
        let chunking = ChunkingConfig::from(&self.settings.chunking);

        if self.settings.embedding.provider == EmbeddingProvider::HuggingFace && hf_token.is_none()
        {
            return Err(ArbitroError::MissingEnv(
                self.settings.inference.token_env.clone(),
            ));
        }
        let embedder = create_embedder(&self.settings.embedding, hf_token)?;

        let index = CorpusIndex::build(
            documents,
            chunker.as_ref(),
            &chunking,
            embedder,
            &self.settings.retrieval,
        )
        .await?;
        info!("Index ready with {} chunks", index.chunk_count().await?);
        Ok(index)
    }

    /// Build the shared handler context: index plus inference client.
    pub async fn build_context(&self, inference_token: &str) -> Result<BotContext> {
        let index = self.build_index(Some(inference_token)).await?;
        let inference = HfInferenceClient::new(&self.settings.inference, inference_token)?;
        info!("Inference endpoint: {}", inference.endpoint());

        Ok(BotContext::new(
            Arc::new(index),
            Arc::new(inference),
            self.prompts.clone(),
        ))
    }

    /// Start the Telegram bot and poll until `shutdown` resolves.
    ///
    /// The token is checked with `getMe` before the corpus is indexed, so a
    /// bad token fails fast.
    pub async fn run_bot<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let secrets = Secrets::from_env(&self.settings)?;
        let poll_timeout = Duration::from_secs(self.settings.telegram.poll_timeout_seconds);
        let telegram = TelegramClient::new(
            &self.settings.telegram.api_base,
            &secrets.telegram_token,
            poll_timeout,
        )?;

        let me = telegram.get_me().await?;
        info!(
            "Authenticated as @{}",
            me.username.as_deref().unwrap_or(&me.first_name)
        );

        let context = self.build_context(&secrets.inference_token).await?;

        BotRunner::new(Arc::new(telegram), Arc::new(context), poll_timeout)
            .with_username(me.username)
            .run(shutdown)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::pdf::tests::write_sample_pdf;

    fn hashing_settings(data_dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.data_dir = data_dir.to_string_lossy().to_string();
        settings.embedding.provider = EmbeddingProvider::Hashing;
        settings.embedding.dimensions = 128;
        settings
    }

    #[tokio::test]
    async fn test_build_index_with_local_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_pdf(&dir.path().join("reglamento.pdf"), "Falta antideportiva");

        let orchestrator = Orchestrator::new(hashing_settings(dir.path())).unwrap();
        let index = orchestrator.build_index(None).await.unwrap();

        assert!(index.chunk_count().await.unwrap() >= 1);
        let context = index.query("falta antideportiva").await.unwrap();
        assert!(context.text.contains("antideportiva"));
    }

    #[tokio::test]
    async fn test_hosted_embeddings_need_token() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = hashing_settings(dir.path());
        settings.embedding.provider = EmbeddingProvider::HuggingFace;

        let orchestrator = Orchestrator::new(settings).unwrap();
        let err = orchestrator.build_index(None).await.unwrap_err();
        assert!(matches!(err, ArbitroError::MissingEnv(name) if name == "HF_TOKEN"));
    }

    #[tokio::test]
    async fn test_unknown_chunking_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = hashing_settings(dir.path());
        settings.chunking.strategy = "semantic".to_string();

        let orchestrator = Orchestrator::new(settings).unwrap();
        assert!(matches!(
            orchestrator.build_index(None).await,
            Err(ArbitroError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_data_dir_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            Orchestrator::new(hashing_settings(&dir.path().join("missing"))).unwrap();
        assert!(orchestrator.build_index(None).await.is_err());
    }
}
