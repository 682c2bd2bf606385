//! Fundraiser creation dialog.
//!
//! [`state`] holds the per-(user, chat) session data, [`transition`] is the pure
//! step function, and [`store`] keeps sessions in memory with per-key exclusion
//! and idle eviction.

/// Session data types.
pub mod state;
/// In-memory session store.
pub mod store;
/// Pure dialog step function.
pub mod transition;

pub use state::{ConversationSession, FundraiserDraft, SessionKey, WizardStep};
pub use store::{SessionGuard, SessionStore, spawn_sweeper};
pub use transition::{Effect, Prompt, Transition, transition};
