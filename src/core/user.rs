//! User business logic - keeps the users table in sync with inbound events.

use crate::{
    entities::{User, user},
    errors::Result,
};
use sea_orm::{Set, prelude::*, sea_query::OnConflict};

/// Sender details as reported by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Telegram user id
    pub telegram_id: i64,
    /// Handle without the leading `@`
    pub username: Option<String>,
    /// First name
    pub first_name: String,
    /// Last name, if set
    pub last_name: Option<String>,
}

/// Inserts the user on first contact, otherwise refreshes the profile fields and
/// `last_active`. Admin and banned flags are never touched here.
///
/// Idempotent: calling it twice for the same profile leaves one row.
pub async fn upsert_user<C>(db: &C, profile: &UserProfile) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();
    let model = user::ActiveModel {
        telegram_id: Set(profile.telegram_id),
        username: Set(profile.username.clone()),
        first_name: Set(profile.first_name.clone()),
        last_name: Set(profile.last_name.clone()),
        is_admin: Set(false),
        is_banned: Set(false),
        created_at: Set(now),
        last_active: Set(now),
    };

    User::insert(model)
        .on_conflict(
            OnConflict::column(user::Column::TelegramId)
                .update_columns([
                    user::Column::Username,
                    user::Column::FirstName,
                    user::Column::LastName,
                    user::Column::LastActive,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;

    User::find_by_id(profile.telegram_id)
        .one(db)
        .await?
        .ok_or(crate::errors::Error::NotFound {
            entity: "User",
            id: profile.telegram_id,
        })
}

/// Looks up a user by Telegram id.
pub async fn get_user<C>(db: &C, telegram_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(telegram_id)
        .one(db)
        .await
        .map_err(Into::into)
}
