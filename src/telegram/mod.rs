//! Minimal Telegram Bot API transport.
//!
//! Only the pieces the bot needs: long polling with `getUpdates`,
//! `sendMessage` and `getMe`.

mod client;

pub use client::{split_message, TelegramClient, MAX_MESSAGE_CHARS};

use serde::{Deserialize, Serialize};

/// An incoming update. Only message updates are requested.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
}

impl Message {
    /// Whether the message starts with a bot command.
    pub fn is_command(&self) -> bool {
        let entity_command = self
            .entities
            .iter()
            .any(|e| e.kind == "bot_command" && e.offset == 0);
        entity_command || self.text.as_deref().is_some_and(|t| t.starts_with('/'))
    }
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}
