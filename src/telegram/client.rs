//! Bot API HTTP client.

use super::{ApiResponse, Message, Update, User};
use crate::error::{ArbitroError, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

/// Telegram rejects messages longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Extra time on top of the long-polling timeout before the HTTP request gives up.
const REQUEST_GRACE_SECS: u64 = 10;

/// Client for one bot token.
pub struct TelegramClient {
    client: reqwest::Client,
    /// `{api_base}/bot{token}`; contains the secret and is never logged.
    base: String,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str, poll_timeout: Duration) -> Result<Self> {
        url::Url::parse(api_base)?;
        let client = reqwest::Client::builder()
            .timeout(poll_timeout + Duration::from_secs(REQUEST_GRACE_SECS))
            .build()?;

        Ok(Self {
            client,
            base: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T> {
        let response = self
            .client
            .post(format!("{}/{}", self.base, method))
            .json(body)
            .send()
            .await
            .map_err(|e| ArbitroError::Telegram(format!("{} request failed: {}", method, e.without_url())))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ArbitroError::Telegram(format!("{} returned invalid JSON: {}", method, e.without_url())))?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                description,
                error_code,
                ..
            } => Err(ArbitroError::Telegram(format!(
                "{} failed ({}): {}",
                method,
                error_code.map_or_else(|| "no code".to_string(), |c| c.to_string()),
                description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }

    /// Identity of the bot; doubles as a token check at startup.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &json!({})).await
    }

    /// Long-poll for message updates after `offset`.
    #[instrument(skip(self))]
    pub async fn get_updates(&self, offset: Option<i64>, timeout: Duration) -> Result<Vec<Update>> {
        let mut body = json!({
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        let updates: Vec<Update> = self.call("getUpdates", &body).await?;
        if !updates.is_empty() {
            debug!("Received {} updates", updates.len());
        }
        Ok(updates)
    }

    /// Send `text` to a chat, split into several messages when it exceeds
    /// the Bot API length limit.
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Vec<Message>> {
        let mut sent = Vec::new();
        for part in split_message(text, MAX_MESSAGE_CHARS) {
            let message: Message = self
                .call("sendMessage", &json!({ "chat_id": chat_id, "text": part }))
                .await?;
            sent.push(message);
        }
        Ok(sent)
    }
}

/// Split text into pieces of at most `limit` characters, preferring line breaks.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut parts = Vec::new();
    let mut rest: Vec<char> = text.chars().collect();

    while rest.len() > limit {
        let cut = rest[..limit]
            .iter()
            .rposition(|&c| c == '\n')
            .filter(|&i| i > 0)
            .unwrap_or(limit);
        parts.push(rest[..cut].iter().collect());
        let skip = if rest.get(cut) == Some(&'\n') { cut + 1 } else { cut };
        rest.drain(..skip);
    }
    if !rest.is_empty() || parts.is_empty() {
        parts.push(rest.into_iter().collect());
    }
    parts
}
