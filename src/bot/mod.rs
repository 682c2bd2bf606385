//! Bot layer - chat-facing interface and command handlers
//!
//! This module turns inbound chat events into calls on the core layer and
//! delivers the replies through the message gateway.

/// Command implementations (general, fundraiser, payment)
pub mod commands;
/// Message gateway client
pub mod gateway;
/// Non-command handlers (the creation dialog)
pub mod handlers;
/// Reply texts
pub mod messages;
/// Command parsing and event dispatch
pub mod router;
/// Inbound webhook payloads
pub mod update;

use crate::{config::Settings, conversation::SessionStore};
use gateway::MessageGateway;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared data available to all handlers.
/// This structure holds the database connection, the dialog sessions, the gateway
/// used for delivery and the runtime settings.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// In-flight creation dialogs
    pub sessions: Arc<SessionStore>,
    /// Outbound delivery
    pub gateway: Arc<dyn MessageGateway>,
    /// Runtime settings
    pub settings: Arc<Settings>,
}

impl BotData {
    /// Creates a new `BotData` instance. This is called once during startup; the
    /// session store is shared with the sweeper task.
    #[must_use]
    pub fn new(
        database: DatabaseConnection,
        sessions: Arc<SessionStore>,
        gateway: Arc<dyn MessageGateway>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            database,
            sessions,
            gateway,
            settings,
        }
    }

    pub(crate) fn currency(&self) -> &str {
        &self.settings.currency
    }
}

/// A message to some other chat, sent after the main reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Target chat. For notifications this is the user's private chat, whose id
    /// equals the user id.
    pub chat_id: i64,
    /// Message text
    pub text: String,
}

/// Outcome of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text sent back to the originating chat
    pub text: String,
    /// Notifications for other participants
    pub notices: Vec<Notice>,
}

impl Reply {
    /// Reply without notifications.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            notices: Vec::new(),
        }
    }

    /// Adds a notification for another chat.
    #[must_use]
    pub fn with_notice(mut self, chat_id: i64, text: impl Into<String>) -> Self {
        self.notices.push(Notice {
            chat_id,
            text: text.into(),
        });
        self
    }
}

pub use router::{Command, handle_event};
pub use update::{InboundEvent, Update};
