//! Configuration settings for Arbitro.

use crate::error::{ArbitroError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub telegram: TelegramSettings,
    pub inference: InferenceSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory scanned once at startup for regulation documents.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    /// Environment variable holding the bot token.
    pub token_env: String,
    /// Bot API base URL.
    pub api_base: String,
    /// Long-polling timeout passed to getUpdates.
    pub poll_timeout_seconds: u64,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            token_env: "TELEGRAM_TOKEN".to_string(),
            api_base: "https://api.telegram.org".to_string(),
            poll_timeout_seconds: 30,
        }
    }
}

/// Retry policy for outbound inference calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt (0 disables retrying).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff_ms: u64,
    /// Upper bound for a single delay.
    pub max_backoff_ms: u64,
    /// Growth factor applied per attempt.
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            multiplier: 2.0,
        }
    }
}

/// Hosted text-generation endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Inference API base URL; requests go to `{base_url}/models/{model}`.
    pub base_url: String,
    /// Model identifier on the inference host.
    pub model: String,
    /// Environment variable holding the bearer token.
    pub token_env: String,
    /// Connect and request timeout, per attempt.
    pub timeout_seconds: u64,
    /// Reply used when a mapping response carries no `generated_text`.
    pub fallback_text: String,
    pub retry: RetrySettings,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co".to_string(),
            model: "mistralai/Mistral-7B-Instruct-v0.1".to_string(),
            token_env: "HF_TOKEN".to_string(),
            timeout_seconds: 20,
            fallback_text: "Sin respuesta.".to_string(),
            retry: RetrySettings::default(),
        }
    }
}

impl InferenceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hugging Face feature-extraction pipeline (default).
    #[default]
    HuggingFace,
    /// Local feature-hashing embedder, no network.
    Hashing,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(EmbeddingProvider::HuggingFace),
            "hashing" | "local" => Ok(EmbeddingProvider::Hashing),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::HuggingFace => write!(f, "huggingface"),
            EmbeddingProvider::Hashing => write!(f, "hashing"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions (used by the hashing provider and to size hosted vectors).
    pub dimensions: u32,
    /// Base URL for the Hugging Face provider.
    pub base_url: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::HuggingFace,
            model: "sentence-transformers/paraphrase-MiniLM-L3-v2".to_string(),
            dimensions: 384,
            base_url: "https://api-inference.huggingface.co".to_string(),
        }
    }
}

/// Document chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Chunking strategy (paragraph, window).
    pub strategy: String,
    /// Target chunk size in characters.
    pub chunk_chars: usize,
    /// Characters shared between consecutive window chunks.
    pub overlap_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            strategy: "paragraph".to_string(),
            chunk_chars: 1_200,
            overlap_chars: 150,
        }
    }
}

/// Retrieval settings for the corpus index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Maximum number of fragments included in a context.
    pub max_context_chunks: usize,
    /// Minimum cosine similarity for a fragment to be included.
    pub min_score: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            max_context_chunks: 4,
            min_score: 0.2,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ArbitroError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("arbitro")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded document directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }
}

/// Credentials read from the environment at startup.
///
/// Tokens are never stored in the configuration file.
#[derive(Clone)]
pub struct Secrets {
    pub telegram_token: String,
    pub inference_token: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("telegram_token", &"<redacted>")
            .field("inference_token", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    /// Read both tokens using the variable names configured in `settings`.
    pub fn from_env(settings: &Settings) -> Result<Self> {
        Ok(Self {
            telegram_token: require_env(&settings.telegram.token_env)?,
            inference_token: require_env(&settings.inference.token_env)?,
        })
    }

    /// Read only the inference token, for commands that never talk to Telegram.
    pub fn inference_token(settings: &Settings) -> Result<String> {
        require_env(&settings.inference.token_env)
    }
}

/// Read a non-empty environment variable.
pub fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ArbitroError::MissingEnv(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_hosted_setup() {
        let settings = Settings::default();
        assert_eq!(settings.general.data_dir, "data");
        assert_eq!(settings.inference.timeout(), Duration::from_secs(20));
        assert_eq!(settings.inference.fallback_text, "Sin respuesta.");
        assert_eq!(settings.inference.token_env, "HF_TOKEN");
        assert_eq!(settings.telegram.token_env, "TELEGRAM_TOKEN");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [inference]
            model = "HuggingFaceH4/zephyr-7b-beta"

            [inference.retry]
            max_retries = 0
            "#,
        )
        .unwrap();

        assert_eq!(settings.inference.model, "HuggingFaceH4/zephyr-7b-beta");
        assert_eq!(settings.inference.retry.max_retries, 0);
        assert_eq!(settings.inference.retry.initial_backoff_ms, 500);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::HuggingFace);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.embedding.provider = EmbeddingProvider::Hashing;
        settings.retrieval.max_context_chunks = 7;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.embedding.provider, EmbeddingProvider::Hashing);
        assert_eq!(loaded.retrieval.max_context_chunks, 7);
    }

    #[test]
    fn test_embedding_provider_parse() {
        assert_eq!("hf".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::HuggingFace);
        assert_eq!("local".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Hashing);
        assert!("word2vec".parse::<EmbeddingProvider>().is_err());
    }

    #[test]
    fn test_require_env_rejects_missing() {
        let err = require_env("ARBITRO_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, ArbitroError::MissingEnv(name) if name == "ARBITRO_TEST_SURELY_UNSET_VARIABLE"));
    }

    #[test]
    fn test_secrets_debug_is_redacted() {
        let secrets = Secrets {
            telegram_token: "123:abc".to_string(),
            inference_token: "hf_xyz".to_string(),
        };
        let rendered = format!("{:?}", secrets);
        assert!(!rendered.contains("hf_xyz"));
        assert!(!rendered.contains("123:abc"));
    }
}
