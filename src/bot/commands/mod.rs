//! Command implementations organized by category.

/// Fundraiser listing and lifecycle commands
pub mod fundraiser;

/// Start, help and fallback replies
pub mod general;

/// Payment reporting and settlement commands
pub mod payment;
