//! User entity - A chat-platform account that has talked to the bot.
//!
//! Keyed by the external Telegram id. Rows are upserted on every inbound event;
//! the admin and banned flags are only changed by the administrative dashboard.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Telegram user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub telegram_id: i64,
    /// Telegram handle without the leading `@`, if the user has one
    pub username: Option<String>,
    /// First name as last seen
    pub first_name: String,
    /// Last name as last seen
    pub last_name: Option<String>,
    /// Bot administrator flag
    pub is_admin: bool,
    /// Banned users get a fixed reply and nothing else
    pub is_banned: bool,
    /// First time the user was seen
    pub created_at: DateTimeUtc,
    /// Refreshed on every inbound event
    pub last_active: DateTimeUtc,
}

impl Model {
    /// Handle if present, otherwise the first name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.first_name)
    }
}

/// Users have no relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
