//! Fundraiser business logic - creation, lookup and lifecycle transitions.
//!
//! Status moves only forward: `active -> completed` when the organizer finishes the
//! fundraiser, `active -> blocked` when it is cancelled. Both transitions are
//! conditional updates on `status = active`, so two racing requests cannot both win.

use crate::{
    core::MAX_AMOUNT,
    entities::{Fundraiser, FundraiserStatus, fundraiser},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Fields collected by the creation wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFundraiser {
    /// Non-empty title
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Target amount, between 1 and [`MAX_AMOUNT`]
    pub goal: i64,
    /// Deadline as typed by the organizer
    pub deadline: Option<String>,
    /// Telegram id of the organizer
    pub creator_id: i64,
    /// Organizer handle, if any
    pub creator_username: Option<String>,
}

/// Creates an active fundraiser with nothing raised yet.
pub async fn create_fundraiser<C>(db: &C, new: NewFundraiser) -> Result<fundraiser::Model>
where
    C: ConnectionTrait,
{
    if new.title.trim().is_empty() {
        return Err(Error::invalid_argument("Fundraiser title cannot be empty"));
    }
    if new.goal <= 0 {
        return Err(Error::invalid_argument(format!(
            "Goal must be greater than zero, got {}",
            new.goal
        )));
    }
    if new.goal > MAX_AMOUNT {
        return Err(Error::invalid_argument(format!(
            "Goal cannot exceed {MAX_AMOUNT}, got {}",
            new.goal
        )));
    }

    let now = chrono::Utc::now();
    let model = fundraiser::ActiveModel {
        title: Set(new.title.trim().to_string()),
        description: Set(new.description.trim().to_string()),
        goal: Set(new.goal),
        raised: Set(0),
        creator_id: Set(new.creator_id),
        creator_username: Set(new.creator_username),
        status: Set(FundraiserStatus::Active),
        deadline: Set(new.deadline),
        created_at: Set(now),
        updated_at: Set(now),
        completed_at: Set(None),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!(
        fundraiser_id = created.id,
        creator_id = created.creator_id,
        "Fundraiser created"
    );
    Ok(created)
}

/// Finds a fundraiser by id.
pub async fn get_fundraiser<C>(db: &C, fundraiser_id: i64) -> Result<Option<fundraiser::Model>>
where
    C: ConnectionTrait,
{
    Fundraiser::find_by_id(fundraiser_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a fundraiser by id, turning a missing row into [`Error::NotFound`].
pub async fn require_fundraiser<C>(db: &C, fundraiser_id: i64) -> Result<fundraiser::Model>
where
    C: ConnectionTrait,
{
    get_fundraiser(db, fundraiser_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Fundraiser",
            id: fundraiser_id,
        })
}

/// All fundraisers created by a user, newest first.
pub async fn list_fundraisers_by_creator<C>(
    db: &C,
    creator_id: i64,
) -> Result<Vec<fundraiser::Model>>
where
    C: ConnectionTrait,
{
    Fundraiser::find()
        .filter(fundraiser::Column::CreatorId.eq(creator_id))
        .order_by_desc(fundraiser::Column::CreatedAt)
        .order_by_desc(fundraiser::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads the fundraiser and checks that `acting_user_id` is its organizer.
pub async fn require_organizer<C>(
    db: &C,
    fundraiser_id: i64,
    acting_user_id: i64,
) -> Result<fundraiser::Model>
where
    C: ConnectionTrait,
{
    let fundraiser = require_fundraiser(db, fundraiser_id).await?;
    if fundraiser.creator_id != acting_user_id {
        return Err(Error::Forbidden {
            message: format!("only the organizer can manage fundraiser #{fundraiser_id}"),
        });
    }
    Ok(fundraiser)
}

/// Organizer finishes the fundraiser; no further payments are accepted.
pub async fn finish_fundraiser<C>(
    db: &C,
    fundraiser_id: i64,
    acting_user_id: i64,
) -> Result<fundraiser::Model>
where
    C: ConnectionTrait,
{
    close_fundraiser(db, fundraiser_id, acting_user_id, FundraiserStatus::Completed).await
}

/// Organizer cancels the fundraiser. It ends up `blocked` and cannot be reopened here.
pub async fn cancel_fundraiser<C>(
    db: &C,
    fundraiser_id: i64,
    acting_user_id: i64,
) -> Result<fundraiser::Model>
where
    C: ConnectionTrait,
{
    close_fundraiser(db, fundraiser_id, acting_user_id, FundraiserStatus::Blocked).await
}

async fn close_fundraiser<C>(
    db: &C,
    fundraiser_id: i64,
    acting_user_id: i64,
    target: FundraiserStatus,
) -> Result<fundraiser::Model>
where
    C: ConnectionTrait,
{
    let fundraiser = require_organizer(db, fundraiser_id, acting_user_id).await?;
    if fundraiser.status != FundraiserStatus::Active {
        return Err(Error::InvalidState {
            message: format!(
                "fundraiser #{fundraiser_id} is already {}",
                fundraiser.status
            ),
        });
    }

    let now = chrono::Utc::now();
    let completed_at = (target == FundraiserStatus::Completed).then_some(now);
    let result = Fundraiser::update_many()
        .set(fundraiser::ActiveModel {
            status: Set(target),
            updated_at: Set(now),
            completed_at: Set(completed_at),
            ..Default::default()
        })
        .filter(fundraiser::Column::Id.eq(fundraiser_id))
        .filter(fundraiser::Column::Status.eq(FundraiserStatus::Active))
        .exec(db)
        .await?;

    // Lost a race against another close request
    if result.rows_affected == 0 {
        let current = require_fundraiser(db, fundraiser_id).await?;
        return Err(Error::InvalidState {
            message: format!("fundraiser #{fundraiser_id} is already {}", current.status),
        });
    }

    info!(fundraiser_id, status = %target, "Fundraiser closed");
    require_fundraiser(db, fundraiser_id).await
}
