//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the users, fundraisers and transactions tables.
//! Each entity has a Model struct for data and an Entity struct for operations.

/// Fundraisers and their lifecycle status.
pub mod fundraiser;
/// Reported payments.
pub mod transaction;
/// Known Telegram users.
pub mod user;

// Re-export specific types to avoid conflicts
pub use fundraiser::{
    Column as FundraiserColumn, Entity as Fundraiser, FundraiserStatus, Model as FundraiserModel,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
    TransactionStatus,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
