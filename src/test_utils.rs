//! Shared test utilities for the collection box bot.
//!
//! This module provides common helper functions for setting up test databases,
//! creating test entities with sensible defaults and recording outbound messages.

#![allow(clippy::unwrap_used)]

use crate::{
    bot::{BotData, InboundEvent, gateway::MessageGateway},
    config::Settings,
    conversation::SessionStore,
    core::{
        fundraiser::{self, NewFundraiser},
        payment::{self, NewPayment},
        user::{UserProfile, upsert_user},
    },
    entities::{User, fundraiser as fundraiser_entity, transaction, user},
    errors::Result,
};
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use std::sync::{Arc, Mutex};

/// Organizer of the fundraisers created by the helpers below
pub const ORGANIZER_ID: i64 = 1001;
/// A donor
pub const DONOR_ID: i64 = 2002;
/// Somebody else (second donor, or an unauthorized actor)
pub const OTHER_USER_ID: i64 = 3003;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Sender profile with first name "Tester".
pub fn test_profile(telegram_id: i64, username: Option<&str>) -> UserProfile {
    UserProfile {
        telegram_id,
        username: username.map(str::to_string),
        first_name: "Tester".to_string(),
        last_name: None,
    }
}

/// Sets the banned flag, creating the user first if needed.
pub async fn ban_test_user(db: &DatabaseConnection, telegram_id: i64) -> Result<()> {
    upsert_user(db, &test_profile(telegram_id, None)).await?;
    User::update(user::ActiveModel {
        telegram_id: Set(telegram_id),
        is_banned: Set(true),
        ..Default::default()
    })
    .exec(db)
    .await?;
    Ok(())
}

/// Fundraiser input with a fixed description and no deadline.
pub fn new_test_fundraiser(creator_id: i64, title: &str, goal: i64) -> NewFundraiser {
    NewFundraiser {
        title: title.to_string(),
        description: format!("{title} description"),
        goal,
        deadline: None,
        creator_id,
        creator_username: Some("organizer".to_string()),
    }
}

/// Creates an active fundraiser.
pub async fn create_test_fundraiser(
    db: &DatabaseConnection,
    creator_id: i64,
    title: &str,
    goal: i64,
) -> Result<fundraiser_entity::Model> {
    fundraiser::create_fundraiser(db, new_test_fundraiser(creator_id, title, goal)).await
}

/// Fresh database with one active fundraiser owned by [`ORGANIZER_ID`], goal 5000.
pub async fn setup_with_fundraiser() -> Result<(DatabaseConnection, fundraiser_entity::Model)> {
    let db = setup_test_db().await?;
    let fundraiser = create_test_fundraiser(&db, ORGANIZER_ID, "Test Fundraiser", 5000).await?;
    Ok((db, fundraiser))
}

/// Payment input in RUB without a note.
pub fn new_test_payment(fundraiser_id: i64, donor_id: i64, amount: i64) -> NewPayment {
    NewPayment {
        fundraiser_id,
        donor_id,
        donor_username: Some(format!("donor{donor_id}")),
        amount,
        currency: "RUB".to_string(),
        note: None,
    }
}

/// Creates a pending payment.
pub async fn create_test_payment(
    db: &DatabaseConnection,
    fundraiser_id: i64,
    donor_id: i64,
    amount: i64,
) -> Result<transaction::Model> {
    let created =
        payment::create_payment(db, new_test_payment(fundraiser_id, donor_id, amount)).await?;
    Ok(created.payment)
}

/// Private-chat event (chat id equals sender id) from a user without a handle.
pub fn test_event(sender_id: i64, text: &str) -> InboundEvent {
    InboundEvent {
        sender: test_profile(sender_id, None),
        chat_id: sender_id,
        text: Some(text.to_string()),
    }
}

/// Gateway that keeps every message instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<(i64, String)>>,
}

impl RecordingGateway {
    /// Everything sent so far, in order.
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts sent to `chat_id`, in order.
    pub fn texts_for(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(chat, _)| *chat == chat_id)
            .map(|(_, text)| text)
            .collect()
    }

    /// Most recent text sent to `chat_id`.
    pub fn last_text_for(&self, chat_id: i64) -> Option<String> {
        self.texts_for(chat_id).pop()
    }
}

#[async_trait]
impl MessageGateway for RecordingGateway {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

/// Bot context over the given connection with default settings.
pub fn test_bot_data_with(db: DatabaseConnection) -> (BotData, Arc<RecordingGateway>) {
    let gateway = Arc::new(RecordingGateway::default());
    let data = BotData::new(
        db,
        Arc::new(SessionStore::new()),
        Arc::clone(&gateway) as Arc<dyn MessageGateway>,
        Arc::new(Settings::default()),
    );
    (data, gateway)
}

/// Bot context over a fresh in-memory database.
pub async fn test_bot_data() -> Result<(BotData, Arc<RecordingGateway>)> {
    Ok(test_bot_data_with(setup_test_db().await?))
}
