//! Index command: build the corpus index once and report what it holds.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{EmbeddingProvider, Secrets, Settings};
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Load and embed the documents without starting the bot.
pub async fn run_index(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Index, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let token = match settings.embedding.provider {
        EmbeddingProvider::HuggingFace => Some(Secrets::inference_token(&settings)?),
        EmbeddingProvider::Hashing => None,
    };
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Indexing regulations...");
    let result = orchestrator.build_index(token.as_deref()).await;
    spinner.finish_and_clear();
    let index = result?;

    let sources = index.sources().await?;
    Output::header("Indexed documents");
    for source in &sources {
        Output::source_info(&source.title, &source.source, source.chunk_count);
    }
    println!();
    Output::success(&format!(
        "{} documents, {} chunks.",
        sources.len(),
        index.chunk_count().await?
    ));
    Ok(())
}
