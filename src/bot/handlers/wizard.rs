//! Drives the fundraiser creation dialog for one (user, chat) pair.
//!
//! Every entry point holds the session lock for its key until the reply is built,
//! so two messages from the same user in the same chat are applied one after the
//! other. The step function itself is pure; this module stores its result and
//! performs the requested effect.

use crate::{
    bot::{BotData, InboundEvent, Reply, messages},
    conversation::{
        ConversationSession, Effect, Prompt, SessionKey, Transition, transition,
        transition::prompt_for,
    },
    core::fundraiser::{NewFundraiser, create_fundraiser},
    errors::Result,
};
use tracing::{debug, info};

fn session_key(event: &InboundEvent) -> SessionKey {
    SessionKey::new(event.sender.telegram_id, event.chat_id)
}

/// Opens a new dialog, replacing any unfinished one.
pub async fn start_dialog(data: &BotData, event: &InboundEvent) -> Result<Reply> {
    let mut guard = data.sessions.lock(session_key(event)).await;
    if guard.get().is_some() {
        debug!("Restarting creation dialog");
    }
    guard.upsert(ConversationSession::start(event.sender.username.clone()));
    Ok(Reply::text(messages::prompt(&Prompt::AskTitle, data.currency())))
}

/// Aborts the dialog if one is open.
pub async fn cancel_dialog(data: &BotData, event: &InboundEvent) -> Result<Reply> {
    let mut guard = data.sessions.lock(session_key(event)).await;
    if guard.take().is_none() {
        return Ok(Reply::text(messages::NO_ACTIVE_DIALOG));
    }
    Ok(Reply::text(messages::prompt(&Prompt::Cancelled, data.currency())))
}

/// Feeds a non-command message to the open dialog, or answers with the default
/// reply when there is none.
///
/// The session is only written back after the effect succeeded; a failed insert
/// leaves the dialog on its confirmation step so the user can answer again.
pub async fn continue_dialog(data: &BotData, event: &InboundEvent) -> Result<Reply> {
    let mut guard = data.sessions.lock(session_key(event)).await;
    let Some(session) = guard.get().cloned() else {
        return Ok(Reply::text(messages::DEFAULT_REPLY));
    };
    let Some(text) = event.text.as_deref() else {
        return Ok(Reply::text(messages::prompt(&prompt_for(&session), data.currency())));
    };

    let Transition {
        next,
        prompt,
        effect,
    } = transition(session, text, chrono::Utc::now());

    let mut reply = prompt.map(|prompt| messages::prompt(&prompt, data.currency()));
    if let Some(Effect::CreateFundraiser(draft)) = effect {
        let fundraiser = create_fundraiser(
            &data.database,
            NewFundraiser {
                title: draft.title,
                description: draft.description,
                goal: draft.goal,
                deadline: Some(draft.deadline),
                creator_id: event.sender.telegram_id,
                creator_username: draft.creator_username,
            },
        )
        .await?;
        info!(fundraiser_id = fundraiser.id, "Fundraiser created from dialog");
        reply = Some(messages::fundraiser_created(&fundraiser));
    }

    match next {
        Some(session) => guard.upsert(session),
        None => guard.delete(),
    }
    Ok(Reply::text(
        reply.unwrap_or_else(|| messages::DEFAULT_REPLY.to_string()),
    ))
}
