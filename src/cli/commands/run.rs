//! Run command: start the Telegram bot.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use tracing::warn;

/// Index the documents and poll Telegram until Ctrl-C.
pub async fn run_bot(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Run, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'arbitro doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    Output::info("Starting bot (Ctrl-C to stop)...");
    orchestrator
        .run_bot(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Could not listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Output::success("Bot stopped.");
    Ok(())
}
