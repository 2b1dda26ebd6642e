//! Ask command implementation.

use crate::bot::BotContext;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Secrets, Settings};
use crate::error::ArbitroError;
use crate::inference::HfInferenceClient;
use crate::orchestrator::Orchestrator;
use crate::rag::Retriever;
use anyhow::Result;
use std::sync::Arc;

/// Answer one question through the same pipeline the bot uses.
pub async fn run_ask(question: &str, show_sources: bool, settings: Settings) -> Result<()> {
    if question.trim().is_empty() {
        return Err(ArbitroError::InvalidInput("the question is empty".to_string()).into());
    }

    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'arbitro doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let token = Secrets::inference_token(&settings)?;
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Indexing regulations...");
    let index = match orchestrator.build_index(Some(&token)).await {
        Ok(index) => Arc::new(index),
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to index documents: {}", e));
            return Err(e.into());
        }
    };

    let inference = HfInferenceClient::new(&orchestrator.settings().inference, &token)?;
    let bot = BotContext::new(
        Arc::clone(&index) as Arc<dyn Retriever>,
        Arc::new(inference),
        orchestrator.prompts().clone(),
    );

    let answer = if show_sources {
        spinner.set_message("Searching regulations...");
        let context = index.query(question).await?;
        spinner.finish_and_clear();
        Output::header("Sources");
        for chunk in &context.chunks {
            Output::fragment(&chunk.title, chunk.score, &chunk.content);
        }
        println!();

        let spinner = Output::spinner("Asking the model...");
        let answer = bot.answer_with_context(&context, question).await;
        spinner.finish_and_clear();
        answer
    } else {
        spinner.set_message("Asking the model...");
        let answer = bot.answer(question).await;
        spinner.finish_and_clear();
        answer
    };

    println!("\n{}\n", answer);
    Ok(())
}
