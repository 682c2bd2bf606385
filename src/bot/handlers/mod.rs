//! Non-command handlers
//!
//! Free text is only meaningful inside the fundraiser creation dialog.

/// Creation dialog: start, continue and cancel
pub mod wizard;
