//! Arbitro - referee regulations assistant
//!
//! A Telegram bot that answers basketball refereeing questions using the
//! federation's regulation documents as context for a hosted language model.
//!
//! # Overview
//!
//! At startup Arbitro:
//! - Extracts text from every PDF and PPTX file in the data directory
//! - Splits it into fragments and embeds them into an in-memory index
//! - Long-polls Telegram and answers each message on its own task
//!
//! Each question retrieves the most relevant fragments, merges them with the
//! question into an instruction prompt and forwards it to the inference
//! endpoint. The bot keeps no conversation memory.
//!
//! # Architecture
//!
//! - `config` - Settings, secrets and message templates
//! - `loader` - Document text extraction
//! - `chunking` - Fragment splitting strategies
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory similarity search
//! - `rag` - Corpus index and prompt composition
//! - `inference` - Hosted text-generation client with retry
//! - `telegram` - Bot API transport
//! - `bot` - Message handling and the polling loop
//! - `orchestrator` - Startup wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use arbitro::config::Settings;
//! use arbitro::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let index = orchestrator.build_index(std::env::var("HF_TOKEN").ok().as_deref()).await?;
//!     let context = index.query("¿Cuándo se señala campo atrás?").await?;
//!     println!("{}", context.text);
//!
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod inference;
pub mod loader;
pub mod orchestrator;
pub mod rag;
pub mod telegram;
pub mod vector_store;

pub use error::{ArbitroError, Result};
