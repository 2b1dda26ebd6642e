//! CLI module for Arbitro.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Arbitro - referee regulations assistant
///
/// A Telegram bot that answers basketball refereeing questions from the
/// federation's regulation documents.
#[derive(Parser, Debug)]
#[command(name = "arbitro")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index the documents and start the Telegram bot
    Run,

    /// Answer a single question from the terminal, as the bot would
    Ask {
        /// The question to ask
        question: String,

        /// Print the retrieved fragments before the answer
        #[arg(short, long)]
        sources: bool,
    },

    /// Load and index the documents, then print a summary
    Index,

    /// Check configuration, credentials and the document directory
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file if none exists
    Init,

    /// Show configuration file path
    Path,
}
