//! Core business logic - framework-agnostic operations over the entity store.
//!
//! Nothing in here knows about Telegram; functions take a database connection
//! and plain values and return models or [`crate::errors::Error`] outcomes.

/// Largest goal or payment amount accepted, in currency minor units.
///
/// Keeps `raised` and the progress arithmetic far away from `i64` overflow.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Fundraiser creation, lookup and lifecycle transitions
pub mod fundraiser;
/// Payment lifecycle - create, confirm, reject, status
pub mod payment;
/// Progress calculations for fundraiser reporting
pub mod report;
/// User upsert and lookup
pub mod user;
