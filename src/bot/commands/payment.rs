//! Payment commands - donors report payments, organizers settle them.
//!
//! Confirm and reject also notify the donor in their private chat, and a new
//! payment notifies the organizer the same way.

use crate::{
    bot::{BotData, InboundEvent, Reply, messages},
    core::payment::{self as core_payment, NewPayment},
    errors::Result,
};
use tracing::info;

/// `/paid <fundraiser_id> <amount> [note]`
pub async fn paid(
    data: &BotData,
    event: &InboundEvent,
    fundraiser_id: i64,
    amount: i64,
    note: Option<String>,
) -> Result<Reply> {
    let created = core_payment::create_payment(
        &data.database,
        NewPayment {
            fundraiser_id,
            donor_id: event.sender.telegram_id,
            donor_username: event.sender.username.clone(),
            amount,
            currency: data.currency().to_string(),
            note,
        },
    )
    .await?;

    info!(
        transaction_id = created.payment.id,
        fundraiser_id, amount, "Payment reported"
    );
    let reply = Reply::text(messages::payment_recorded(&created.payment, &created.fundraiser));
    Ok(reply.with_notice(
        created.fundraiser.creator_id,
        messages::organizer_new_payment(&created.payment, &created.fundraiser, event.sender_name()),
    ))
}

/// `/confirm <transaction_id>`
pub async fn confirm(data: &BotData, event: &InboundEvent, transaction_id: i64) -> Result<Reply> {
    let settled =
        core_payment::confirm_payment(&data.database, transaction_id, event.sender.telegram_id)
            .await?;
    let reply = Reply::text(messages::payment_confirmed(&settled.payment, &settled.fundraiser));
    Ok(reply.with_notice(
        settled.payment.donor_id,
        messages::donor_payment_confirmed(&settled.payment, &settled.fundraiser),
    ))
}

/// `/reject <transaction_id> [reason]`
pub async fn reject(
    data: &BotData,
    event: &InboundEvent,
    transaction_id: i64,
    reason: Option<String>,
) -> Result<Reply> {
    let settled = core_payment::reject_payment(
        &data.database,
        transaction_id,
        event.sender.telegram_id,
        reason,
    )
    .await?;
    let reply = Reply::text(messages::payment_rejected(&settled.payment));
    Ok(reply.with_notice(
        settled.payment.donor_id,
        messages::donor_payment_rejected(&settled.payment, &settled.fundraiser),
    ))
}

/// `/mypayments`
pub async fn my_payments(data: &BotData, event: &InboundEvent) -> Result<Reply> {
    let status = core_payment::get_payment_status(&data.database, event.sender.telegram_id).await?;
    Ok(Reply::text(messages::payment_status(&status, data.currency())))
}

/// `/pending <fundraiser_id>`
pub async fn pending(data: &BotData, event: &InboundEvent, fundraiser_id: i64) -> Result<Reply> {
    let (fundraiser, pending) = core_payment::list_pending_payments(
        &data.database,
        fundraiser_id,
        event.sender.telegram_id,
    )
    .await?;
    Ok(Reply::text(messages::pending_list(&fundraiser, &pending)))
}
