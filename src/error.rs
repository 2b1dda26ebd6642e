//! Error types for Arbitro.

use thiserror::Error;

/// Library-level error type for Arbitro operations.
#[derive(Error, Debug)]
pub enum ArbitroError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable {0}. Export it before starting the bot.")]
    MissingEnv(String),

    #[error("Document extraction failed for {path}: {reason}")]
    Extraction { path: String, reason: String },

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Arbitro operations.
pub type Result<T> = std::result::Result<T, ArbitroError>;
