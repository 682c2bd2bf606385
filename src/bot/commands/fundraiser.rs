//! Fundraiser commands - listing, details and the organizer's lifecycle actions.

use crate::{
    bot::{BotData, InboundEvent, Reply, messages},
    core::{fundraiser as core_fundraiser, report},
    entities::FundraiserStatus,
    errors::{Error, Result},
};

/// `/myfundraisers`
pub async fn my_fundraisers(data: &BotData, event: &InboundEvent) -> Result<Reply> {
    let fundraisers =
        core_fundraiser::list_fundraisers_by_creator(&data.database, event.sender.telegram_id)
            .await?;
    Ok(Reply::text(messages::fundraiser_list(
        &fundraisers,
        data.currency(),
    )))
}

/// `/fundraiser <id>`, open to everyone.
pub async fn details(data: &BotData, fundraiser_id: i64) -> Result<Reply> {
    let report = report::generate_fundraiser_report(&data.database, fundraiser_id).await?;
    Ok(Reply::text(messages::fundraiser_details(
        &report,
        data.currency(),
    )))
}

/// `/start_collection <id>` - the organizer gets an invitation to share with donors.
pub async fn start_collection(
    data: &BotData,
    event: &InboundEvent,
    fundraiser_id: i64,
) -> Result<Reply> {
    let fundraiser =
        core_fundraiser::require_organizer(&data.database, fundraiser_id, event.sender.telegram_id)
            .await?;
    if fundraiser.status != FundraiserStatus::Active {
        return Err(Error::InvalidState {
            message: format!("fundraiser #{fundraiser_id} is {}", fundraiser.status),
        });
    }
    Ok(Reply::text(messages::collection_invitation(
        &fundraiser,
        data.currency(),
        data.settings.bot_username.as_deref(),
    )))
}

/// `/finish <id>`
pub async fn finish(data: &BotData, event: &InboundEvent, fundraiser_id: i64) -> Result<Reply> {
    let fundraiser =
        core_fundraiser::finish_fundraiser(&data.database, fundraiser_id, event.sender.telegram_id)
            .await?;
    Ok(Reply::text(messages::fundraiser_closed(
        &fundraiser,
        data.currency(),
    )))
}

/// `/cancel <id>`
pub async fn cancel(data: &BotData, event: &InboundEvent, fundraiser_id: i64) -> Result<Reply> {
    let fundraiser =
        core_fundraiser::cancel_fundraiser(&data.database, fundraiser_id, event.sender.telegram_id)
            .await?;
    Ok(Reply::text(messages::fundraiser_closed(
        &fundraiser,
        data.currency(),
    )))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_my_fundraisers_lists_only_own() -> Result<()> {
        let (data, _gateway) = test_bot_data().await?;
        create_test_fundraiser(&data.database, ORGANIZER_ID, "Gift", 5000).await?;
        create_test_fundraiser(&data.database, OTHER_USER_ID, "Trip", 9000).await?;

        let reply = my_fundraisers(&data, &test_event(ORGANIZER_ID, "/myfundraisers")).await?;
        assert!(reply.text.contains("Gift"));
        assert!(reply.text.contains("0/5000 RUB (0%)"));
        assert!(!reply.text.contains("Trip"));
        Ok(())
    }

    #[tokio::test]
    async fn test_details_not_found() -> Result<()> {
        let (data, _gateway) = test_bot_data().await?;
        let err = details(&data, 404).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 404, .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_details_shows_progress_bar() -> Result<()> {
        let (data, _gateway) = test_bot_data().await?;
        let fundraiser = create_test_fundraiser(&data.database, ORGANIZER_ID, "Gift", 5000).await?;

        let reply = details(&data, fundraiser.id).await?;
        assert!(reply.text.contains("[░░░░░░░░░░] 0%"));
        assert!(reply.text.contains("Remaining: 5000 RUB"));
        Ok(())
    }

    #[tokio::test]
    async fn test_start_collection_organizer_only() -> Result<()> {
        let (data, _gateway) = test_bot_data().await?;
        let fundraiser = create_test_fundraiser(&data.database, ORGANIZER_ID, "Gift", 5000).await?;

        let reply =
            start_collection(&data, &test_event(ORGANIZER_ID, "/start_collection"), fundraiser.id)
                .await?;
        assert!(reply.text.contains(&format!("/paid {} <amount>", fundraiser.id)));

        let err = start_collection(&data, &test_event(DONOR_ID, "/start_collection"), fundraiser.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_start_collection_requires_active() -> Result<()> {
        let (data, _gateway) = test_bot_data().await?;
        let fundraiser = create_test_fundraiser(&data.database, ORGANIZER_ID, "Gift", 5000).await?;
        let organizer = test_event(ORGANIZER_ID, "/cancel");
        cancel(&data, &organizer, fundraiser.id).await?;

        let err = start_collection(&data, &organizer, fundraiser.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_finish_twice_is_invalid_state() -> Result<()> {
        let (data, _gateway) = test_bot_data().await?;
        let fundraiser = create_test_fundraiser(&data.database, ORGANIZER_ID, "Gift", 5000).await?;
        let organizer = test_event(ORGANIZER_ID, "/finish");

        let reply = finish(&data, &organizer, fundraiser.id).await?;
        assert!(reply.text.contains("finished"));
        let err = finish(&data, &organizer, fundraiser.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
        Ok(())
    }
}
