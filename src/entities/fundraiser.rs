//! Fundraiser entity - A donation campaign with a goal and a running raised total.
//!
//! `raised` always equals the sum of the fundraiser's confirmed transactions and is
//! only ever changed by [`crate::core::payment::confirm_payment`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a fundraiser.
///
/// `Active` is the only status that accepts new payments. There is no path back
/// to `Active` from either terminal status.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum FundraiserStatus {
    /// Collecting payments
    #[sea_orm(string_value = "active")]
    Active,
    /// Finished by the organizer
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Cancelled by the organizer or blocked by moderation
    #[sea_orm(string_value = "blocked")]
    Blocked,
}

impl fmt::Display for FundraiserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
        };
        f.write_str(label)
    }
}

/// Fundraiser database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fundraisers")]
pub struct Model {
    /// Unique identifier for the fundraiser
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Short title shown in lists
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Target amount in whole currency units, always positive
    pub goal: i64,
    /// Sum of confirmed transaction amounts
    pub raised: i64,
    /// Telegram id of the organizer
    pub creator_id: i64,
    /// Organizer handle at creation time
    pub creator_username: Option<String>,
    /// Lifecycle status
    pub status: FundraiserStatus,
    /// Deadline as typed by the organizer (`DD.MM.YYYY`, not calendar-checked)
    pub deadline: Option<String>,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Bumped on every change, including new payments
    pub updated_at: DateTimeUtc,
    /// Set when the organizer finishes the fundraiser
    pub completed_at: Option<DateTimeUtc>,
}

/// Defines relationships between Fundraiser and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One fundraiser has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
