//! Inbound updates as posted by the Telegram webhook.
//!
//! Only the fields the engine reads are modelled; serde ignores the rest.

use crate::core::user::UserProfile;
use serde::Deserialize;

/// Top-level webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic id assigned by Telegram
    pub update_id: i64,
    /// Absent for update kinds the bot does not handle
    #[serde(default)]
    pub message: Option<Message>,
}

/// A chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Id within the chat
    pub message_id: i64,
    /// Sender; missing for channel posts
    #[serde(default)]
    pub from: Option<TelegramUser>,
    /// Chat the message was sent in
    pub chat: Chat,
    /// Text body; `None` for stickers, photos and the like
    #[serde(default)]
    pub text: Option<String>,
}

/// Sender of a message.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    /// Telegram user id
    pub id: i64,
    /// First name, always present
    pub first_name: String,
    /// Last name, if set
    #[serde(default)]
    pub last_name: Option<String>,
    /// Handle without the leading `@`
    #[serde(default)]
    pub username: Option<String>,
}

/// Chat a message belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Chat id; equals the user id in private chats
    pub id: i64,
    /// `private`, `group`, `supergroup` or `channel`
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// One chat event, the unit of work of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Who sent the event
    pub sender: UserProfile,
    /// Chat to reply in
    pub chat_id: i64,
    /// Message text, if any
    pub text: Option<String>,
}

impl InboundEvent {
    /// Handle if present, otherwise first name.
    #[must_use]
    pub fn sender_name(&self) -> &str {
        self.sender
            .username
            .as_deref()
            .unwrap_or(&self.sender.first_name)
    }
}

impl Update {
    /// Extracts the chat event. Updates without a message or without a sender
    /// (channel posts, callback queries, ...) yield `None`.
    #[must_use]
    pub fn into_event(self) -> Option<InboundEvent> {
        let message = self.message?;
        let from = message.from?;
        Some(InboundEvent {
            sender: UserProfile {
                telegram_id: from.id,
                username: from.username,
                first_name: from.first_name,
                last_name: from.last_name,
            },
            chat_id: message.chat.id,
            text: message.text,
        })
    }
}
