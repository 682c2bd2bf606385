//! General commands - start, help and the unknown-command fallback.
//! These never touch the database.

use crate::bot::{InboundEvent, Reply, messages};
use tracing::debug;

/// Greets the sender.
pub fn start(event: &InboundEvent) -> Reply {
    Reply::text(messages::welcome(&event.sender.first_name))
}

/// Lists the available commands.
pub fn help() -> Reply {
    Reply::text(messages::HELP)
}

/// Fixed reply for a `/token` the bot does not know.
pub fn unknown(token: &str) -> Reply {
    debug!(token, "Unknown command");
    Reply::text(messages::UNKNOWN_COMMAND)
}
