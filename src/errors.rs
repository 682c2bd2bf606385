//! Unified error type for the collection box bot.
//!
//! Domain variants (`InvalidArgument`, `NotFound`, `Forbidden`, `InvalidState`,
//! `AlreadyFinalized`) are expected outcomes that get rendered back to the user.
//! Everything else is infrastructure failure.

use crate::entities::transaction::TransactionStatus;
use thiserror::Error;

/// All errors produced by the bot.
#[derive(Debug, Error)]
pub enum Error {
    /// Database failure (connection lost, constraint violation, ...)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Malformed user input (amount, id, date)
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Human readable description of the problem
        message: String,
    },

    /// A referenced fundraiser or transaction does not exist
    #[error("{entity} #{id} not found")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Requested id
        id: i64,
    },

    /// The acting user is not allowed to perform the operation
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Why the operation was refused
        message: String,
    },

    /// The operation is not valid for the record's current status
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Why the operation was refused
        message: String,
    },

    /// The transaction was already confirmed or rejected
    #[error("Transaction #{id} is already {status}")]
    AlreadyFinalized {
        /// Transaction id
        id: i64,
        /// Terminal status the transaction is in
        status: TransactionStatus,
    },

    /// The chat platform refused a request
    #[error("Gateway error: {message}")]
    Gateway {
        /// Description returned by the platform
        message: String,
    },

    /// HTTP transport failure talking to the chat platform
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O failure (config file, socket)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Returns true for outcomes that are reported to the user as-is
    /// rather than as a generic failure.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. }
                | Self::NotFound { .. }
                | Self::Forbidden { .. }
                | Self::InvalidState { .. }
                | Self::AlreadyFinalized { .. }
        )
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
