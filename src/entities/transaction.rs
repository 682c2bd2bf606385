//! Transaction entity - A single donor's payment against a fundraiser.
//!
//! Transactions start `pending` and are moved exactly once to `confirmed` or
//! `rejected` by the fundraiser's organizer. Backticks are used for field names
//! to enable proper documentation linking.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Settlement status of a payment. `Confirmed` and `Rejected` are terminal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TransactionStatus {
    /// Waiting for the organizer
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Counted towards the fundraiser's raised total
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    /// Refused by the organizer
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl TransactionStatus {
    /// Whether the status can no longer change.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Only payment method the bot records
pub const PAYMENT_METHOD_TELEGRAM_STARS: &str = "telegram_stars";

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the fundraiser this payment goes to
    pub fundraiser_id: i64,
    /// Telegram id of the donor
    pub donor_id: i64,
    /// Donor handle at payment time
    pub donor_username: Option<String>,
    /// Payment amount, always positive
    pub amount: i64,
    /// Currency code, e.g. `"RUB"`
    pub currency: String,
    /// Settlement status
    pub status: TransactionStatus,
    /// Always `"telegram_stars"` for now
    pub payment_method: String,
    /// When the donor reported the payment
    pub created_at: DateTimeUtc,
    /// Set on confirmation
    pub confirmed_at: Option<DateTimeUtc>,
    /// Set on rejection
    pub rejected_at: Option<DateTimeUtc>,
    /// Donor's comment
    pub notes: Option<String>,
    /// Organizer's reason, only set on rejection
    pub rejection_reason: Option<String>,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one fundraiser
    #[sea_orm(
        belongs_to = "super::fundraiser::Entity",
        from = "Column::FundraiserId",
        to = "super::fundraiser::Column::Id"
    )]
    Fundraiser,
}

impl Related<super::fundraiser::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fundraiser.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
