//! Configuration module for Arbitro.
//!
//! Handles loading application settings, prompt templates and the
//! environment-provided secrets.

mod prompts;
mod settings;

pub use prompts::{BotMessages, Prompts, RagPrompts};
pub use settings::{
    require_env, ChunkingSettings, EmbeddingProvider, EmbeddingSettings, GeneralSettings,
    InferenceSettings, PromptSettings, RetrievalSettings, RetrySettings, Secrets, Settings,
    TelegramSettings,
};
