//! Command router - classifies inbound events and dispatches them.
//!
//! Every event first refreshes the sender's user record. Text starting with `/` is
//! parsed into a [`Command`]; other text continues the sender's creation dialog if
//! one is open, and gets the default reply otherwise.

use super::{BotData, InboundEvent, Reply, commands, handlers, messages};
use crate::{
    core::user::upsert_user,
    errors::{Error, Result},
};
use tracing::{debug, error, instrument, warn};

/// A recognized command with its parsed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`
    Start,
    /// `/help`
    Help,
    /// `/newfundraiser`, opens the creation dialog
    NewFundraiser,
    /// `/myfundraisers`
    MyFundraisers,
    /// `/mypayments`
    MyPayments,
    /// `/fundraiser <id>`
    Fundraiser {
        /// Fundraiser to show
        fundraiser_id: i64,
    },
    /// `/pending <id>`
    Pending {
        /// Fundraiser whose pending payments are listed
        fundraiser_id: i64,
    },
    /// `/startcollection <id>`
    StartCollection {
        /// Fundraiser to announce
        fundraiser_id: i64,
    },
    /// `/finish <id>`
    Finish {
        /// Fundraiser to complete
        fundraiser_id: i64,
    },
    /// Without an id this aborts the creation dialog
    Cancel {
        /// Fundraiser to cancel
        fundraiser_id: Option<i64>,
    },
    /// `/paid <id> <amount> [note]`
    Paid {
        /// Fundraiser paid into
        fundraiser_id: i64,
        /// Positive amount
        amount: i64,
        /// Rest of the line, if any
        note: Option<String>,
    },
    /// `/confirm <transaction id>`
    Confirm {
        /// Payment to confirm
        transaction_id: i64,
    },
    /// `/reject <transaction id> [reason]`
    Reject {
        /// Payment to reject
        transaction_id: i64,
        /// Rest of the line, if any
        reason: Option<String>,
    },
    /// Any other `/token`
    Unknown(String),
}

impl Command {
    /// Parses a message. Returns `None` when the text is not a command at all and
    /// `Some(Err(_))` when a known command has malformed arguments.
    ///
    /// The command token is matched case-insensitively and an `@botname` suffix is
    /// ignored. Commands meant for other bots are filtered out before parsing, see
    /// [`addressed_to_other_bot`].
    pub fn parse(text: &str) -> Option<Result<Self>> {
        let rest = text.trim_start().strip_prefix('/')?;
        let (token, args) = split_word(rest);
        let token = token.to_lowercase();
        let name = token.split_once('@').map_or(token.as_str(), |(name, _)| name);

        Some(Self::from_parts(name, args))
    }

    fn from_parts(name: &str, args: &str) -> Result<Self> {
        let command = match name {
            "start" => Self::Start,
            "help" => Self::Help,
            "newfundraiser" | "new_fundraiser" => Self::NewFundraiser,
            "myfundraisers" | "my_fundraisers" => Self::MyFundraisers,
            "mypayments" | "my_payments" => Self::MyPayments,
            "fundraiser" => Self::Fundraiser {
                fundraiser_id: required_id(args, "/fundraiser <id>")?.0,
            },
            "pending" => Self::Pending {
                fundraiser_id: required_id(args, "/pending <fundraiser_id>")?.0,
            },
            "start_collection" => Self::StartCollection {
                fundraiser_id: required_id(args, "/start_collection <fundraiser_id>")?.0,
            },
            "finish" => Self::Finish {
                fundraiser_id: required_id(args, "/finish <fundraiser_id>")?.0,
            },
            "cancel" => Self::Cancel {
                fundraiser_id: if args.trim().is_empty() {
                    None
                } else {
                    Some(required_id(args, "/cancel [fundraiser_id]")?.0)
                },
            },
            "paid" => {
                const USAGE: &str = "/paid <fundraiser_id> <amount> [note]";
                let (fundraiser_id, rest) = required_id(args, USAGE)?;
                let (amount, note) = split_word(rest);
                let amount = amount.parse().map_err(|_| {
                    Error::invalid_argument(format!("Amount must be a whole number. Usage: {USAGE}"))
                })?;
                Self::Paid {
                    fundraiser_id,
                    amount,
                    note: optional_text(note),
                }
            }
            "confirm" => Self::Confirm {
                transaction_id: required_id(args, "/confirm <transaction_id>")?.0,
            },
            "reject" => {
                let (transaction_id, reason) = required_id(args, "/reject <transaction_id> [reason]")?;
                Self::Reject {
                    transaction_id,
                    reason: optional_text(reason),
                }
            }
            other => Self::Unknown(other.to_string()),
        };
        Ok(command)
    }
}

/// Splits off the first whitespace-delimited word; the remainder keeps its inner
/// spacing.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    text.split_once(char::is_whitespace)
        .map_or((text, ""), |(word, rest)| (word, rest.trim_start()))
}

fn required_id<'a>(args: &'a str, usage: &str) -> Result<(i64, &'a str)> {
    let (word, rest) = split_word(args);
    let id = word
        .parse()
        .map_err(|_| Error::invalid_argument(format!("Usage: {usage}")))?;
    Ok((id, rest))
}

/// True for `/command@name` when a bot handle is configured and `name` is not it.
/// Without a configured handle every suffix is accepted.
#[must_use]
pub fn addressed_to_other_bot(text: &str, bot_username: Option<&str>) -> bool {
    let Some(me) = bot_username.map(|name| name.trim_start_matches('@')) else {
        return false;
    };
    let Some(rest) = text.trim_start().strip_prefix('/') else {
        return false;
    };
    let (token, _) = split_word(rest);
    token
        .split_once('@')
        .is_some_and(|(_, target)| !target.eq_ignore_ascii_case(me))
}

fn optional_text(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Handles one inbound event end to end: user upsert, dispatch, reply delivery.
///
/// Domain errors are rendered to the user and count as handled. Datastore
/// failures produce a generic reply and are returned so the launcher can report
/// the event as failed.
#[instrument(skip(data, event), fields(sender = event.sender.telegram_id, chat = event.chat_id))]
pub async fn handle_event(data: &BotData, event: InboundEvent) -> Result<()> {
    debug!(text = event.text.as_deref(), "Inbound event");

    let bot_username = data.settings.bot_username.as_deref();
    let outcome = match upsert_user(&data.database, &event.sender).await {
        Ok(_)
            if event
                .text
                .as_deref()
                .is_some_and(|text| addressed_to_other_bot(text, bot_username)) =>
        {
            debug!("Command addressed to another bot, ignoring");
            return Ok(());
        }
        Ok(user) if user.is_banned => Ok(Reply::text(messages::BANNED)),
        Ok(_) => dispatch(data, &event).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(reply) => {
            deliver(data, event.chat_id, reply).await;
            Ok(())
        }
        Err(e) if e.is_user_facing() => {
            debug!("Rejected: {e}");
            deliver(data, event.chat_id, Reply::text(messages::error_reply(&e))).await;
            Ok(())
        }
        Err(e) => {
            error!("Failed to handle event: {e}");
            deliver(data, event.chat_id, Reply::text(messages::GENERIC_FAILURE)).await;
            Err(e)
        }
    }
}

async fn dispatch(data: &BotData, event: &InboundEvent) -> Result<Reply> {
    match event.text.as_deref().and_then(Command::parse) {
        Some(command) => run_command(data, event, command?).await,
        None => handlers::wizard::continue_dialog(data, event).await,
    }
}

async fn run_command(data: &BotData, event: &InboundEvent, command: Command) -> Result<Reply> {
    debug!(?command, "Dispatching command");
    match command {
        Command::Start => Ok(commands::general::start(event)),
        Command::Help => Ok(commands::general::help()),
        Command::Unknown(token) => Ok(commands::general::unknown(&token)),
        Command::NewFundraiser => handlers::wizard::start_dialog(data, event).await,
        Command::Cancel {
            fundraiser_id: None,
        } => handlers::wizard::cancel_dialog(data, event).await,
        Command::Cancel {
            fundraiser_id: Some(fundraiser_id),
        } => commands::fundraiser::cancel(data, event, fundraiser_id).await,
        Command::MyFundraisers => commands::fundraiser::my_fundraisers(data, event).await,
        Command::Fundraiser { fundraiser_id } => {
            commands::fundraiser::details(data, fundraiser_id).await
        }
        Command::StartCollection { fundraiser_id } => {
            commands::fundraiser::start_collection(data, event, fundraiser_id).await
        }
        Command::Finish { fundraiser_id } => {
            commands::fundraiser::finish(data, event, fundraiser_id).await
        }
        Command::Paid {
            fundraiser_id,
            amount,
            note,
        } => commands::payment::paid(data, event, fundraiser_id, amount, note).await,
        Command::Confirm { transaction_id } => {
            commands::payment::confirm(data, event, transaction_id).await
        }
        Command::Reject {
            transaction_id,
            reason,
        } => commands::payment::reject(data, event, transaction_id, reason).await,
        Command::MyPayments => commands::payment::my_payments(data, event).await,
        Command::Pending { fundraiser_id } => {
            commands::payment::pending(data, event, fundraiser_id).await
        }
    }
}

async fn deliver(data: &BotData, chat_id: i64, reply: Reply) {
    send(data, chat_id, &reply.text).await;
    for notice in reply.notices {
        send(data, notice.chat_id, &notice.text).await;
    }
}

async fn send(data: &BotData, chat_id: i64, text: &str) {
    if let Err(e) = data.gateway.send_message(chat_id, text).await {
        warn!(chat_id, "Failed to deliver message: {e}");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        conversation::SessionKey,
        core::{fundraiser::get_fundraiser, payment::get_payment_status},
        entities::{FundraiserStatus, TransactionStatus},
        test_utils::*,
    };

    #[test]
    fn test_parse_not_a_command() {
        assert!(Command::parse("hello").is_none());
        assert!(Command::parse("").is_none());
    }

    #[test]
    fn test_parse_normalizes_token() {
        assert_eq!(Command::parse("/HELP").unwrap().unwrap(), Command::Help);
        assert_eq!(
            Command::parse("/newfundraiser@collection_box_bot").unwrap().unwrap(),
            Command::NewFundraiser
        );
        assert_eq!(
            Command::parse("  /MyFundraisers").unwrap().unwrap(),
            Command::MyFundraisers
        );
    }

    #[test]
    fn test_parse_paid_with_note() {
        let command = Command::parse("/paid 3 500 for the  cake").unwrap().unwrap();
        assert_eq!(
            command,
            Command::Paid {
                fundraiser_id: 3,
                amount: 500,
                note: Some("for the  cake".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_paid_requires_amount() {
        let err = Command::parse("/paid 3").unwrap().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        let err = Command::parse("/paid 3 abc").unwrap().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_parse_cancel_with_and_without_id() {
        assert_eq!(
            Command::parse("/cancel").unwrap().unwrap(),
            Command::Cancel {
                fundraiser_id: None
            }
        );
        assert_eq!(
            Command::parse("/cancel 12").unwrap().unwrap(),
            Command::Cancel {
                fundraiser_id: Some(12)
            }
        );
        assert!(Command::parse("/cancel twelve").unwrap().is_err());
    }

    #[test]
    fn test_parse_reject_reason_and_unknown() {
        assert_eq!(
            Command::parse("/reject 7 wrong amount").unwrap().unwrap(),
            Command::Reject {
                transaction_id: 7,
                reason: Some("wrong amount".to_string()),
            }
        );
        assert_eq!(
            Command::parse("/dance now").unwrap().unwrap(),
            Command::Unknown("dance".to_string())
        );
    }

    #[test]
    fn test_addressed_to_other_bot() {
        let me = Some("collection_box_bot");
        assert!(addressed_to_other_bot("/help@otherbot", me));
        assert!(!addressed_to_other_bot("/help@Collection_Box_Bot", me));
        assert!(!addressed_to_other_bot("/help", me));
        assert!(!addressed_to_other_bot("hello@otherbot", me));
        // Configured handle may carry the leading '@'
        assert!(addressed_to_other_bot("/help@otherbot", Some("@collection_box_bot")));
        assert!(!addressed_to_other_bot("/help@collection_box_bot", Some("@collection_box_bot")));
        // No configured handle: every suffix is ours
        assert!(!addressed_to_other_bot("/help@otherbot", None));
    }

    #[tokio::test]
    async fn test_group_command_for_other_bot_is_ignored() -> Result<()> {
        let (mut data, gateway) = test_bot_data().await?;
        data.settings = std::sync::Arc::new(crate::config::Settings {
            bot_username: Some("collection_box_bot".to_string()),
            ..Default::default()
        });

        handle_event(&data, test_event(DONOR_ID, "/help@otherbot")).await?;
        assert!(gateway.texts_for(DONOR_ID).is_empty());

        handle_event(&data, test_event(DONOR_ID, "/help@collection_box_bot")).await?;
        assert_eq!(gateway.texts_for(DONOR_ID), vec![messages::HELP.to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_plain_text_without_session_gets_default_reply() -> Result<()> {
        let (data, gateway) = test_bot_data().await?;
        handle_event(&data, test_event(DONOR_ID, "hello")).await?;
        assert_eq!(gateway.texts_for(DONOR_ID), vec![messages::DEFAULT_REPLY.to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_command_is_not_an_error() -> Result<()> {
        let (data, gateway) = test_bot_data().await?;
        handle_event(&data, test_event(DONOR_ID, "/dance")).await?;
        assert_eq!(gateway.texts_for(DONOR_ID), vec![messages::UNKNOWN_COMMAND.to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_every_event_upserts_user() -> Result<()> {
        let (data, _gateway) = test_bot_data().await?;
        handle_event(&data, test_event(DONOR_ID, "/help")).await?;
        let user = crate::core::user::get_user(&data.database, DONOR_ID).await?;
        assert!(user.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_banned_user_is_not_dispatched() -> Result<()> {
        let (data, gateway) = test_bot_data().await?;
        handle_event(&data, test_event(DONOR_ID, "/help")).await?;
        ban_test_user(&data.database, DONOR_ID).await?;

        handle_event(&data, test_event(DONOR_ID, "/newfundraiser")).await?;
        assert_eq!(gateway.last_text_for(DONOR_ID).unwrap(), messages::BANNED);
        assert!(data.sessions.get(SessionKey::new(DONOR_ID, DONOR_ID)).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_full_creation_dialog() -> Result<()> {
        let (data, gateway) = test_bot_data().await?;
        for text in ["/newfundraiser", "Gift", "5000", "Birthday gift", "01.12.2026", "yes"] {
            handle_event(&data, test_event(ORGANIZER_ID, text)).await?;
        }

        let fundraiser = get_fundraiser(&data.database, 1).await?.unwrap();
        assert_eq!(fundraiser.title, "Gift");
        assert_eq!(fundraiser.goal, 5000);
        assert_eq!(fundraiser.raised, 0);
        assert_eq!(fundraiser.deadline.as_deref(), Some("01.12.2026"));
        assert_eq!(fundraiser.status, FundraiserStatus::Active);
        assert!(gateway.last_text_for(ORGANIZER_ID).unwrap().contains("#1"));

        let key = SessionKey::new(ORGANIZER_ID, ORGANIZER_ID);
        assert!(data.sessions.get(key).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_goal_reprompts() -> Result<()> {
        let (data, gateway) = test_bot_data().await?;
        for text in ["/newfundraiser", "Gift", "lots"] {
            handle_event(&data, test_event(ORGANIZER_ID, text)).await?;
        }
        assert_eq!(
            gateway.last_text_for(ORGANIZER_ID).unwrap(),
            messages::prompt(&crate::conversation::Prompt::InvalidGoal, "RUB")
        );
        let session = data
            .sessions
            .get(SessionKey::new(ORGANIZER_ID, ORGANIZER_ID))
            .await
            .unwrap();
        assert_eq!(session.step, crate::conversation::WizardStep::GoalAmount);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_command_aborts_dialog() -> Result<()> {
        let (data, gateway) = test_bot_data().await?;
        handle_event(&data, test_event(ORGANIZER_ID, "/newfundraiser")).await?;
        handle_event(&data, test_event(ORGANIZER_ID, "/cancel")).await?;

        assert!(
            data.sessions
                .get(SessionKey::new(ORGANIZER_ID, ORGANIZER_ID))
                .await
                .is_none()
        );
        handle_event(&data, test_event(ORGANIZER_ID, "Gift")).await?;
        assert_eq!(
            gateway.last_text_for(ORGANIZER_ID).unwrap(),
            messages::DEFAULT_REPLY
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_text_after_sweep_gets_default_reply() -> Result<()> {
        let (data, gateway) = test_bot_data().await?;
        handle_event(&data, test_event(ORGANIZER_ID, "/newfundraiser")).await?;

        let later = chrono::Utc::now() + chrono::Duration::minutes(31);
        let evicted = data
            .sessions
            .sweep_at(later, data.settings.session_timeout())
            .await;
        assert_eq!(evicted, 1);

        handle_event(&data, test_event(ORGANIZER_ID, "Gift")).await?;
        assert_eq!(
            gateway.last_text_for(ORGANIZER_ID).unwrap(),
            messages::DEFAULT_REPLY
        );
        assert!(get_fundraiser(&data.database, 1).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_flow_with_notifications() -> Result<()> {
        let (data, gateway) = test_bot_data().await?;
        let fundraiser = create_test_fundraiser(&data.database, ORGANIZER_ID, "Gift", 5000).await?;

        handle_event(&data, test_event(DONOR_ID, &format!("/paid {} 500 cake", fundraiser.id))).await?;
        let organizer_notice = gateway.last_text_for(ORGANIZER_ID).unwrap();
        assert!(organizer_notice.contains("500 RUB"));
        assert!(organizer_notice.contains("Note: cake"));

        let status = get_payment_status(&data.database, DONOR_ID).await?;
        let (payment, _) = &status.payments[0];
        assert_eq!(payment.status, TransactionStatus::Pending);

        handle_event(&data, test_event(ORGANIZER_ID, &format!("/confirm {}", payment.id))).await?;
        assert!(gateway.last_text_for(DONOR_ID).unwrap().contains("confirmed"));

        let fundraiser = get_fundraiser(&data.database, fundraiser.id).await?.unwrap();
        assert_eq!(fundraiser.raised, 500);

        // Redelivered confirmation is benign
        handle_event(&data, test_event(ORGANIZER_ID, &format!("/confirm {}", payment.id))).await?;
        assert!(gateway.last_text_for(ORGANIZER_ID).unwrap().contains("already confirmed"));
        let fundraiser = get_fundraiser(&data.database, fundraiser.id).await?.unwrap();
        assert_eq!(fundraiser.raised, 500);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_organizer_cannot_confirm() -> Result<()> {
        let (data, gateway) = test_bot_data().await?;
        let fundraiser = create_test_fundraiser(&data.database, ORGANIZER_ID, "Gift", 5000).await?;
        let payment = create_test_payment(&data.database, fundraiser.id, DONOR_ID, 500).await?;

        handle_event(&data, test_event(OTHER_USER_ID, &format!("/confirm {}", payment.id))).await?;
        assert!(gateway.last_text_for(OTHER_USER_ID).unwrap().starts_with("Not allowed"));
        let fundraiser = get_fundraiser(&data.database, fundraiser.id).await?.unwrap();
        assert_eq!(fundraiser.raised, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_arguments_get_usage() -> Result<()> {
        let (data, gateway) = test_bot_data().await?;
        handle_event(&data, test_event(DONOR_ID, "/confirm abc")).await?;
        assert!(gateway.last_text_for(DONOR_ID).unwrap().contains("/confirm <transaction_id>"));
        Ok(())
    }

    #[tokio::test]
    async fn test_finish_blocks_new_payments() -> Result<()> {
        let (data, gateway) = test_bot_data().await?;
        let fundraiser = create_test_fundraiser(&data.database, ORGANIZER_ID, "Gift", 5000).await?;

        handle_event(&data, test_event(ORGANIZER_ID, &format!("/finish {}", fundraiser.id))).await?;
        assert!(gateway.last_text_for(ORGANIZER_ID).unwrap().contains("finished"));

        handle_event(&data, test_event(DONOR_ID, &format!("/paid {} 100", fundraiser.id))).await?;
        assert!(gateway.last_text_for(DONOR_ID).unwrap().starts_with("Cannot do that"));
        Ok(())
    }

    #[tokio::test]
    async fn test_datastore_failure_gets_generic_reply() -> Result<()> {
        use sea_orm::{DatabaseBackend, MockDatabase};

        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_errors([sea_orm::DbErr::Custom("database is locked".to_string())])
            .append_exec_errors([sea_orm::DbErr::Custom("database is locked".to_string())])
            .into_connection();
        let (data, gateway) = test_bot_data_with(db);

        let result = handle_event(&data, test_event(DONOR_ID, "/help")).await;
        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(
            gateway.last_text_for(DONOR_ID).unwrap(),
            messages::GENERIC_FAILURE
        );
        Ok(())
    }
}
