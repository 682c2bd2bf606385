//! Reply texts.
//!
//! Plain text only: the gateway sends no parse mode, so user supplied titles and
//! notes never need escaping.

use crate::{
    conversation::{FundraiserDraft, Prompt},
    core::{
        payment::PaymentStatus,
        report::{FundraiserReport, calculate_progress, format_progress_bar},
    },
    entities::{fundraiser, transaction},
    errors::Error,
};
use std::fmt::Write as _;

/// Reply to plain text outside the creation dialog.
pub const DEFAULT_REPLY: &str = "I only understand commands. Send /help to see what I can do.";
/// Reply to an unrecognized `/token`.
pub const UNKNOWN_COMMAND: &str = "Unknown command. Send /help to see the list of commands.";
/// The only reply a banned user ever gets.
pub const BANNED: &str = "Access to the bot is restricted for your account.";
/// Shown when storage fails; the details only go to the log.
pub const GENERIC_FAILURE: &str = "Something went wrong on our side. Please try again later.";
/// Reply to a bare `/cancel` with no dialog in progress.
pub const NO_ACTIVE_DIALOG: &str = "There is nothing to cancel.";

/// Command reference sent by `/help`.
pub const HELP: &str = "Collection box commands\n\n\
Organizers\n\
/newfundraiser - create a fundraiser step by step\n\
/myfundraisers - list your fundraisers\n\
/start_collection <id> - get an invitation to share with donors\n\
/pending <id> - payments waiting for your confirmation\n\
/confirm <transaction_id> - confirm a received payment\n\
/reject <transaction_id> [reason] - reject a payment\n\
/finish <id> - close a fundraiser\n\
/cancel <id> - cancel a fundraiser\n\n\
Donors\n\
/fundraiser <id> - fundraiser details\n\
/paid <id> <amount> [note] - report a payment\n\
/mypayments - your payments\n\n\
/cancel - abort the creation dialog\n\
/help - this message";

/// `500 RUB`
#[must_use]
pub fn money(amount: i64, currency: &str) -> String {
    format!("{amount} {currency}")
}

/// Greeting sent by `/start`.
#[must_use]
pub fn welcome(first_name: &str) -> String {
    format!(
        "Hello, {first_name}! I keep track of donations for group fundraisers.\n\n\
         Create one with /newfundraiser or report a payment with /paid <id> <amount>.\n\
         Send /help for all commands."
    )
}

/// Renders a dialog prompt.
#[must_use]
pub fn prompt(prompt: &Prompt, currency: &str) -> String {
    match prompt {
        Prompt::AskTitle => "Let's create a fundraiser. What is it called?".to_string(),
        Prompt::AskGoal => format!("What is the goal amount in {currency}?"),
        Prompt::InvalidGoal => "Please send the goal as a positive whole number.".to_string(),
        Prompt::AskDescription => "Describe what the money is for.".to_string(),
        Prompt::AskDeadline => "When does the collection end? Use DD.MM.YYYY.".to_string(),
        Prompt::InvalidDeadline => "Please send the date as DD.MM.YYYY.".to_string(),
        Prompt::Confirm(draft) => confirmation(draft, currency),
        Prompt::Cancelled => "Fundraiser creation cancelled.".to_string(),
    }
}

fn confirmation(draft: &FundraiserDraft, currency: &str) -> String {
    let field = |value: Option<&str>| value.unwrap_or("-").to_string();
    format!(
        "Please check the fundraiser:\n\n\
         Title: {}\n\
         Goal: {}\n\
         Description: {}\n\
         Deadline: {}\n\n\
         Reply \"yes\" to create it, anything else cancels.",
        field(draft.title.as_deref()),
        draft
            .goal
            .map_or_else(|| "-".to_string(), |goal| money(goal, currency)),
        field(draft.description.as_deref()),
        field(draft.deadline.as_deref()),
    )
}

/// Confirmation sent to the organizer once the fundraiser is stored.
#[must_use]
pub fn fundraiser_created(fundraiser: &fundraiser::Model) -> String {
    format!(
        "Fundraiser #{} \"{}\" created.\n\
         Share /start_collection {} to get an invitation for donors.",
        fundraiser.id, fundraiser.title, fundraiser.id
    )
}

/// One line per fundraiser, for `/myfundraisers`.
#[must_use]
pub fn fundraiser_list(fundraisers: &[fundraiser::Model], currency: &str) -> String {
    if fundraisers.is_empty() {
        return "You have no fundraisers yet. Create one with /newfundraiser.".to_string();
    }

    let mut text = String::from("Your fundraisers:\n");
    for fundraiser in fundraisers {
        let _ = write!(
            text,
            "\n#{} {} [{}]\n{}/{} {currency} ({}%)",
            fundraiser.id,
            fundraiser.title,
            fundraiser.status,
            fundraiser.raised,
            fundraiser.goal,
            calculate_progress(fundraiser.raised, fundraiser.goal),
        );
    }
    text
}

/// Full card with progress, for `/fundraiser`.
#[must_use]
pub fn fundraiser_details(report: &FundraiserReport, currency: &str) -> String {
    let fundraiser = &report.fundraiser;
    let mut text = format!(
        "Fundraiser #{}: {}\n{}\n\n\
         Status: {}\n\
         Raised: {} of {}\n\
         {}\n\
         Confirmed donations: {}",
        fundraiser.id,
        fundraiser.title,
        fundraiser.description,
        fundraiser.status,
        money(fundraiser.raised, currency),
        money(fundraiser.goal, currency),
        format_progress_bar(report.progress_percent, None),
        report.confirmed_donations,
    );
    if report.amount_remaining > 0 {
        let _ = write!(text, "\nRemaining: {}", money(report.amount_remaining, currency));
    }
    if let Some(deadline) = &fundraiser.deadline {
        let _ = write!(text, "\nDeadline: {deadline}");
    }
    if let Some(organizer) = &fundraiser.creator_username {
        let _ = write!(text, "\nOrganizer: @{organizer}");
    }
    text
}

/// Group announcement posted by `/startcollection`.
#[must_use]
pub fn collection_invitation(
    fundraiser: &fundraiser::Model,
    currency: &str,
    bot_username: Option<&str>,
) -> String {
    let mut text = format!(
        "Collection for \"{}\" is open!\n{}\n\n\
         Goal: {}\n\
         After transferring money send:\n/paid {} <amount>",
        fundraiser.title,
        fundraiser.description,
        money(fundraiser.goal, currency),
        fundraiser.id,
    );
    if let Some(bot) = bot_username {
        let _ = write!(text, "\n\nto @{bot}");
    }
    text
}

/// Final summary after `/finish`.
#[must_use]
pub fn fundraiser_closed(fundraiser: &fundraiser::Model, currency: &str) -> String {
    match fundraiser.status {
        fundraiser::FundraiserStatus::Completed => format!(
            "Fundraiser #{} finished. Raised {} of {}.",
            fundraiser.id,
            money(fundraiser.raised, currency),
            money(fundraiser.goal, currency),
        ),
        _ => format!("Fundraiser #{} cancelled.", fundraiser.id),
    }
}

/// Acknowledgement sent to the donor after `/paid`.
#[must_use]
pub fn payment_recorded(payment: &transaction::Model, fundraiser: &fundraiser::Model) -> String {
    format!(
        "Payment #{} of {} to \"{}\" recorded. The organizer will confirm it soon.",
        payment.id,
        money(payment.amount, &payment.currency),
        fundraiser.title,
    )
}

/// Notice to the organizer about a new pending payment.
#[must_use]
pub fn organizer_new_payment(
    payment: &transaction::Model,
    fundraiser: &fundraiser::Model,
    donor: &str,
) -> String {
    let mut text = format!(
        "New payment #{} for \"{}\": {} from {donor}.",
        payment.id,
        fundraiser.title,
        money(payment.amount, &payment.currency),
    );
    if let Some(note) = &payment.notes {
        let _ = write!(text, "\nNote: {note}");
    }
    let _ = write!(
        text,
        "\n\n/confirm {} or /reject {} [reason]",
        payment.id, payment.id
    );
    text
}

/// Reply to the organizer after `/confirm`.
#[must_use]
pub fn payment_confirmed(payment: &transaction::Model, fundraiser: &fundraiser::Model) -> String {
    format!(
        "Payment #{} confirmed. \"{}\" has now raised {} of {}.",
        payment.id,
        fundraiser.title,
        money(fundraiser.raised, &payment.currency),
        money(fundraiser.goal, &payment.currency),
    )
}

/// Notice to the donor after their payment is confirmed.
#[must_use]
pub fn donor_payment_confirmed(payment: &transaction::Model, fundraiser: &fundraiser::Model) -> String {
    format!(
        "Your payment #{} of {} to \"{}\" was confirmed. Thank you!",
        payment.id,
        money(payment.amount, &payment.currency),
        fundraiser.title,
    )
}

/// Reply to the organizer after `/reject`.
#[must_use]
pub fn payment_rejected(payment: &transaction::Model) -> String {
    format!("Payment #{} rejected.", payment.id)
}

/// Notice to the donor after their payment is rejected.
#[must_use]
pub fn donor_payment_rejected(payment: &transaction::Model, fundraiser: &fundraiser::Model) -> String {
    let mut text = format!(
        "Your payment #{} of {} to \"{}\" was rejected by the organizer.",
        payment.id,
        money(payment.amount, &payment.currency),
        fundraiser.title,
    );
    if let Some(reason) = &payment.rejection_reason {
        let _ = write!(text, "\nReason: {reason}");
    }
    text
}

/// Payment history for `/mypayments`.
#[must_use]
pub fn payment_status(status: &PaymentStatus, currency: &str) -> String {
    if status.payments.is_empty() {
        return "You have not reported any payments yet.".to_string();
    }

    let mut text = String::from("Your payments:\n");
    for (payment, fundraiser) in &status.payments {
        let title = fundraiser.as_ref().map_or("deleted fundraiser", |f| f.title.as_str());
        let _ = write!(
            text,
            "\n#{} {} to \"{title}\" [{}]",
            payment.id,
            money(payment.amount, &payment.currency),
            payment.status,
        );
    }
    let _ = write!(
        text,
        "\n\nConfirmed total: {}",
        money(status.confirmed_total, currency)
    );
    text
}

/// Pending payments awaiting review, for `/pending`.
#[must_use]
pub fn pending_list(fundraiser: &fundraiser::Model, pending: &[transaction::Model]) -> String {
    if pending.is_empty() {
        return format!("No pending payments for \"{}\".", fundraiser.title);
    }

    let mut text = format!("Pending payments for \"{}\":\n", fundraiser.title);
    for payment in pending {
        let donor = payment
            .donor_username
            .as_ref()
            .map_or_else(|| format!("user {}", payment.donor_id), |name| format!("@{name}"));
        let _ = write!(
            text,
            "\n#{} {} from {donor}",
            payment.id,
            money(payment.amount, &payment.currency),
        );
        if let Some(note) = &payment.notes {
            let _ = write!(text, " ({note})");
        }
    }
    text
}

/// Text for a domain error. Infrastructure errors all map to [`GENERIC_FAILURE`].
#[must_use]
pub fn error_reply(error: &Error) -> String {
    match error {
        Error::InvalidArgument { message } => message.clone(),
        Error::NotFound { .. } | Error::AlreadyFinalized { .. } => error.to_string(),
        Error::Forbidden { message } => format!("Not allowed: {message}."),
        Error::InvalidState { message } => format!("Cannot do that: {message}."),
        _ => GENERIC_FAILURE.to_string(),
    }
}
