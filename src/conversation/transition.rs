//! Pure step function of the creation dialog.
//!
//! `transition(session, input, now)` never touches storage. It returns the session to
//! keep (or `None` when the dialog is over), the prompt to send, and at most one
//! side effect for the caller to carry out.
//!
//! Invalid input on a data step re-prompts without advancing. The confirmation step
//! has no retry: anything but an affirmative reply cancels.

use super::state::{ConversationSession, FundraiserDraft, WizardStep};
use crate::core::MAX_AMOUNT;
use chrono::{DateTime, Utc};

/// Replies accepted as "yes" on the confirmation step, compared case-insensitively.
pub const AFFIRMATIVE_REPLIES: &[&str] = &["yes", "да"];

/// What the bot should say after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Ask for the title
    AskTitle,
    /// Ask for the goal amount
    AskGoal,
    /// The goal was not a positive whole number in range
    InvalidGoal,
    /// Ask for the description
    AskDescription,
    /// Ask for the deadline
    AskDeadline,
    /// The deadline did not match `DD.MM.YYYY`
    InvalidDeadline,
    /// Summary of every collected field, asking for confirmation
    Confirm(FundraiserDraft),
    /// The dialog was aborted
    Cancelled,
}

/// A fully collected draft, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedDraft {
    /// Fundraiser title
    pub title: String,
    /// Goal in whole currency units
    pub goal: i64,
    /// Fundraiser description
    pub description: String,
    /// Deadline as typed
    pub deadline: String,
    /// Organizer handle captured when the dialog started
    pub creator_username: Option<String>,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Persist the fundraiser; the reply depends on the stored id
    CreateFundraiser(CompletedDraft),
}

/// Result of feeding one message to the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Session to store; `None` deletes it
    pub next: Option<ConversationSession>,
    /// Reply to send; `None` when the effect determines the reply
    pub prompt: Option<Prompt>,
    /// Work to do before replying
    pub effect: Option<Effect>,
}

impl Transition {
    fn stay(mut session: ConversationSession, prompt: Prompt, now: DateTime<Utc>) -> Self {
        session.last_touched = now;
        Self {
            next: Some(session),
            prompt: Some(prompt),
            effect: None,
        }
    }

    fn advance(
        mut session: ConversationSession,
        step: WizardStep,
        prompt: Prompt,
        now: DateTime<Utc>,
    ) -> Self {
        session.step = step;
        Self::stay(session, prompt, now)
    }

    const fn finish(prompt: Option<Prompt>, effect: Option<Effect>) -> Self {
        Self {
            next: None,
            prompt,
            effect,
        }
    }
}

/// The prompt that asks for the input `step` expects.
#[must_use]
pub fn prompt_for(session: &ConversationSession) -> Prompt {
    match session.step {
        WizardStep::Title => Prompt::AskTitle,
        WizardStep::GoalAmount => Prompt::AskGoal,
        WizardStep::Description => Prompt::AskDescription,
        WizardStep::Deadline => Prompt::AskDeadline,
        WizardStep::Confirmation => Prompt::Confirm(session.draft.clone()),
    }
}

/// Advances the dialog by one message.
#[must_use]
pub fn transition(session: ConversationSession, input: &str, now: DateTime<Utc>) -> Transition {
    let text = input.trim();

    match session.step {
        WizardStep::Title => {
            if text.is_empty() {
                return Transition::stay(session, Prompt::AskTitle, now);
            }
            let mut session = session;
            session.draft.title = Some(text.to_string());
            Transition::advance(session, WizardStep::GoalAmount, Prompt::AskGoal, now)
        }
        WizardStep::GoalAmount => match parse_goal(text) {
            Some(goal) => {
                let mut session = session;
                session.draft.goal = Some(goal);
                Transition::advance(session, WizardStep::Description, Prompt::AskDescription, now)
            }
            None => Transition::stay(session, Prompt::InvalidGoal, now),
        },
        WizardStep::Description => {
            if text.is_empty() {
                return Transition::stay(session, Prompt::AskDescription, now);
            }
            let mut session = session;
            session.draft.description = Some(text.to_string());
            Transition::advance(session, WizardStep::Deadline, Prompt::AskDeadline, now)
        }
        WizardStep::Deadline => {
            if !is_three_part_date(text) {
                return Transition::stay(session, Prompt::InvalidDeadline, now);
            }
            let mut session = session;
            session.draft.deadline = Some(text.to_string());
            let summary = Prompt::Confirm(session.draft.clone());
            Transition::advance(session, WizardStep::Confirmation, summary, now)
        }
        WizardStep::Confirmation => {
            if !is_affirmative(text) {
                return Transition::finish(Some(Prompt::Cancelled), None);
            }
            match complete(session) {
                Some(draft) => Transition::finish(None, Some(Effect::CreateFundraiser(draft))),
                None => Transition::finish(Some(Prompt::Cancelled), None),
            }
        }
    }
}

/// Strips every non-digit character and parses the rest; only values in
/// `1..=MAX_AMOUNT` pass.
fn parse_goal(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse::<i64>()
        .ok()
        .filter(|goal| (1..=MAX_AMOUNT).contains(goal))
}

/// `DD.MM.YYYY`-shaped: three non-empty dot-separated parts. Calendar validity is
/// not checked.
fn is_three_part_date(text: &str) -> bool {
    let parts: Vec<&str> = text.split('.').collect();
    parts.len() == 3 && parts.iter().all(|part| !part.trim().is_empty())
}

fn is_affirmative(text: &str) -> bool {
    let lowered = text.to_lowercase();
    AFFIRMATIVE_REPLIES.contains(&lowered.as_str())
}

fn complete(session: ConversationSession) -> Option<CompletedDraft> {
    let FundraiserDraft {
        title,
        goal,
        description,
        deadline,
    } = session.draft;
    Some(CompletedDraft {
        title: title?,
        goal: goal?,
        description: description?,
        deadline: deadline?,
        creator_username: session.creator_username,
    })
}
