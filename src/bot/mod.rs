//! Chat front-end: turns incoming messages into replies.
//!
//! The bot is stateless. Each message is answered on its own from the shared
//! [`BotContext`], which is built once at startup.

mod runner;

pub use runner::{BotRunner, ChatTransport};

use crate::config::Prompts;
use crate::inference::{InferenceClient, InferenceError};
use crate::rag::{compose, Context, Retriever};
use crate::telegram::Message;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// What the bot should do with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Start,
    Text(String),
}

/// Classify a message. Returns `None` for anything the bot ignores: non-text
/// messages, blank text, and commands other than `/start`.
///
/// `/start@other_bot` is ignored when `bot_username` is known and differs.
pub fn parse_inbound(message: &Message, bot_username: Option<&str>) -> Option<Inbound> {
    let text = message.text.as_deref()?.trim();
    if text.is_empty() {
        return None;
    }

    if !message.is_command() {
        return Some(Inbound::Text(text.to_string()));
    }

    let command = text.split_whitespace().next().unwrap_or_default();
    let (name, target) = match command.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (command, None),
    };

    let addressed_to_us = match (target, bot_username) {
        (Some(target), Some(me)) => target.eq_ignore_ascii_case(me),
        _ => true,
    };

    (name == "/start" && addressed_to_us).then_some(Inbound::Start)
}

/// Everything a handler needs, shared across concurrent handlers.
pub struct BotContext {
    retriever: Arc<dyn Retriever>,
    inference: Arc<dyn InferenceClient>,
    prompts: Prompts,
}

impl BotContext {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        inference: Arc<dyn InferenceClient>,
        prompts: Prompts,
    ) -> Self {
        Self {
            retriever,
            inference,
            prompts,
        }
    }

    pub fn welcome(&self) -> &str {
        &self.prompts.bot.welcome
    }

    /// Reply for an inbound message.
    pub async fn respond(&self, inbound: &Inbound) -> String {
        match inbound {
            Inbound::Start => self.welcome().to_string(),
            Inbound::Text(question) => self.answer(question).await,
        }
    }

    /// Retrieve context, compose the prompt, run inference. Failures become
    /// user-facing error strings; this never returns an error.
    #[instrument(skip(self), fields(question_chars = question.chars().count()))]
    pub async fn answer(&self, question: &str) -> String {
        let context = match self.retriever.retrieve(question).await {
            Ok(context) => context,
            Err(e) => {
                warn!("Retrieval failed: {}", e);
                return self.prompts.bot.retrieval_error.clone();
            }
        };
        debug!(
            "Retrieved {} fragments ({} chars)",
            context.chunks.len(),
            context.text.len()
        );

        self.answer_with_context(&context, question).await
    }

    /// Compose and infer over a context the caller already retrieved.
    pub async fn answer_with_context(&self, context: &Context, question: &str) -> String {
        let prompt = compose(&self.prompts, &context.text, question);

        match self.inference.infer(&prompt).await {
            Ok(text) if text.trim().is_empty() => self.prompts.bot.empty_answer.clone(),
            Ok(text) => text,
            Err(e) => {
                warn!("Inference failed: {}", e);
                self.error_reply(&e)
            }
        }
    }

    /// The chat message shown for an inference failure.
    pub fn error_reply(&self, error: &InferenceError) -> String {
        let messages = &self.prompts.bot;
        let mut vars = HashMap::new();
        let template = match error {
            InferenceError::Status { code, .. } => {
                vars.insert("status".to_string(), code.to_string());
                &messages.status_error
            }
            InferenceError::Timeout | InferenceError::Transport(_) => {
                vars.insert("detail".to_string(), error.to_string());
                &messages.transport_error
            }
            InferenceError::UnexpectedResponseShape(_) => &messages.unexpected_response,
        };
        self.prompts.render_with_custom(template, &vars)
    }
}
