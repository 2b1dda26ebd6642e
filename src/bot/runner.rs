//! Long-polling loop.

use super::{parse_inbound, BotContext};
use crate::error::Result;
use crate::telegram::{TelegramClient, Update};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const ERROR_BACKOFF_INITIAL: Duration = Duration::from_secs(1);
const ERROR_BACKOFF_MAX: Duration = Duration::from_secs(30);

/// Where updates come from and replies go to.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Wait up to `timeout` for updates with id at least `offset`.
    async fn updates(&self, offset: Option<i64>, timeout: Duration) -> Result<Vec<Update>>;

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn updates(&self, offset: Option<i64>, timeout: Duration) -> Result<Vec<Update>> {
        self.get_updates(offset, timeout).await
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await.map(|_| ())
    }
}

/// Polls the transport and answers every message on its own task.
pub struct BotRunner {
    transport: Arc<dyn ChatTransport>,
    context: Arc<BotContext>,
    bot_username: Option<String>,
    poll_timeout: Duration,
}

impl BotRunner {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        context: Arc<BotContext>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            context,
            bot_username: None,
            poll_timeout,
        }
    }

    /// Username used to filter `/start@name` commands in groups.
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    /// Poll until `shutdown` resolves. Handlers already spawned keep running.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut offset: Option<i64> = None;
        let mut backoff = ERROR_BACKOFF_INITIAL;

        info!("Polling for updates");
        loop {
            let batch = tokio::select! {
                _ = &mut shutdown => break,
                batch = self.transport.updates(offset, self.poll_timeout) => batch,
            };

            match batch {
                Ok(updates) => {
                    backoff = ERROR_BACKOFF_INITIAL;
                    for update in updates {
                        offset = Some(offset.map_or(update.update_id + 1, |o| {
                            o.max(update.update_id + 1)
                        }));
                        self.dispatch(update);
                    }
                }
                Err(e) => {
                    warn!("Polling failed: {}; retrying in {:?}", e, backoff);
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(ERROR_BACKOFF_MAX);
                }
            }
        }

        info!("Shutdown requested, stopped polling");
        Ok(())
    }

    fn dispatch(&self, update: Update) {
        let Some(message) = update.message else {
            debug!("Skipping update {} without message", update.update_id);
            return;
        };
        let Some(inbound) = parse_inbound(&message, self.bot_username.as_deref()) else {
            debug!("Ignoring message {} in chat {}", message.message_id, message.chat.id);
            return;
        };

        let transport = Arc::clone(&self.transport);
        let context = Arc::clone(&self.context);
        let chat_id = message.chat.id;
        tokio::spawn(async move {
            let reply = context.respond(&inbound).await;
            if let Err(e) = transport.send_text(chat_id, &reply).await {
                warn!("Failed to reply in chat {}: {}", chat_id, e);
            }
        });
    }
}
