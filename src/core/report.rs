//! Report generation business logic.
//!
//! This module provides progress calculations and the fundraiser detail report.
//! All functions are framework-agnostic and return structured data that is
//! formatted by the bot layer.

use crate::{core::payment, entities::fundraiser, errors::Result};
use sea_orm::ConnectionTrait;

/// Fundraiser details with derived progress figures.
#[derive(Debug, Clone)]
pub struct FundraiserReport {
    /// The fundraiser being reported on
    pub fundraiser: fundraiser::Model,
    /// Raised as a rounded percentage of the goal
    pub progress_percent: i64,
    /// Number of confirmed donations
    pub confirmed_donations: u64,
    /// Amount still missing to reach the goal (0 once reached)
    pub amount_remaining: i64,
}

/// Generates the detail report for a fundraiser.
///
/// # Errors
/// [`crate::errors::Error::NotFound`] if the fundraiser does not exist.
pub async fn generate_fundraiser_report<C>(db: &C, fundraiser_id: i64) -> Result<FundraiserReport>
where
    C: ConnectionTrait,
{
    let fundraiser = crate::core::fundraiser::require_fundraiser(db, fundraiser_id).await?;
    let confirmed_donations = payment::count_confirmed_payments(db, fundraiser_id).await?;

    Ok(FundraiserReport {
        progress_percent: calculate_progress(fundraiser.raised, fundraiser.goal),
        amount_remaining: (fundraiser.goal - fundraiser.raised).max(0),
        confirmed_donations,
        fundraiser,
    })
}

/// Calculates how much of the goal has been raised, rounded to a whole percent.
///
/// - 0% = nothing raised
/// - 100% = goal reached
/// - Values above 100% mean the goal was exceeded
///
/// A non-positive goal yields 0.
#[must_use]
pub fn calculate_progress(raised: i64, goal: i64) -> i64 {
    if goal <= 0 {
        return 0;
    }

    // Round half up; i128 cannot overflow for any pair of i64 inputs
    let (raised, goal) = (i128::from(raised.max(0)), i128::from(goal));
    let percent = (raised * 200 + goal) / (goal * 2);
    i64::try_from(percent).unwrap_or(i64::MAX)
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80%`
///
/// # Arguments
/// * `progress_percent` - Progress percentage (clamped to 0-100 for the bar only)
/// * `bar_length` - Length of the progress bar in characters (default 10)
#[must_use]
pub fn format_progress_bar(progress_percent: i64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped = usize::try_from(progress_percent.clamp(0, 100)).unwrap_or(0);

    let filled = (clamped * length + 50) / 100;
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {progress_percent}%")
}
