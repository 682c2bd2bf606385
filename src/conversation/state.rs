//! Session data for the fundraiser creation dialog.

use chrono::{DateTime, Utc};

/// Identifies one dialog: a user talking in a particular chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Telegram id of the organizer
    pub user_id: i64,
    /// Chat the dialog runs in
    pub chat_id: i64,
}

impl SessionKey {
    /// Key for `user_id` in `chat_id`.
    #[must_use]
    pub const fn new(user_id: i64, chat_id: i64) -> Self {
        Self { user_id, chat_id }
    }
}

/// Dialog steps, in the only order they can be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    /// Waiting for the title
    Title,
    /// Waiting for a positive whole goal
    GoalAmount,
    /// Waiting for the description
    Description,
    /// Waiting for a `DD.MM.YYYY` date
    Deadline,
    /// Waiting for yes or no
    Confirmation,
}

/// Fields collected so far. Each is filled by exactly one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundraiserDraft {
    /// Set on the title step
    pub title: Option<String>,
    /// Set on the goal step
    pub goal: Option<i64>,
    /// Set on the description step
    pub description: Option<String>,
    /// Set on the deadline step
    pub deadline: Option<String>,
}

/// An in-progress creation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSession {
    /// Step waiting for input
    pub step: WizardStep,
    /// Answers collected so far
    pub draft: FundraiserDraft,
    /// Organizer handle captured when the dialog started
    pub creator_username: Option<String>,
    /// Last time the organizer answered; drives idle eviction
    pub last_touched: DateTime<Utc>,
}

impl ConversationSession {
    /// A fresh dialog waiting for the title.
    #[must_use]
    pub fn start(creator_username: Option<String>) -> Self {
        Self {
            step: WizardStep::Title,
            draft: FundraiserDraft::default(),
            creator_username,
            last_touched: Utc::now(),
        }
    }

    /// Whether the session has been idle for longer than `max_idle` at `now`.
    #[must_use]
    pub fn is_idle(&self, now: DateTime<Utc>, max_idle: std::time::Duration) -> bool {
        let idle = now.signed_duration_since(self.last_touched);
        chrono::Duration::from_std(max_idle).is_ok_and(|max| idle > max)
    }
}
