//! Payment business logic - the lifecycle of a donation.
//!
//! Donors create `pending` transactions; the fundraiser's organizer settles each one
//! exactly once. Confirmation is the only operation that changes a fundraiser's
//! `raised` total, and it does so inside one database transaction together with the
//! status change:
//!
//! 1. `UPDATE transactions SET status = 'confirmed' WHERE id = ? AND status = 'pending'`
//! 2. `UPDATE fundraisers SET raised = raised + amount WHERE id = ?`
//!
//! Step 1 acts as a compare-and-swap: of two concurrent confirmations for the same
//! transaction only one sees a row affected, and step 2 is an in-place increment, so
//! confirmations of different transactions never overwrite each other's totals.

use crate::{
    core::{MAX_AMOUNT, fundraiser::require_fundraiser},
    entities::{
        Fundraiser, FundraiserStatus, Transaction, TransactionStatus, fundraiser, transaction,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument, warn};

/// A donor's request to pay into a fundraiser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    /// Fundraiser the payment goes to
    pub fundraiser_id: i64,
    /// Telegram id of the donor
    pub donor_id: i64,
    /// Donor handle, if any
    pub donor_username: Option<String>,
    /// Paid amount, between 1 and [`MAX_AMOUNT`]
    pub amount: i64,
    /// Currency code
    pub currency: String,
    /// Donor comment
    pub note: Option<String>,
}

/// A settled or pending payment together with the fundraiser it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentWithFundraiser {
    /// The payment
    pub payment: transaction::Model,
    /// Fundraiser it belongs to
    pub fundraiser: fundraiser::Model,
}

/// Everything a donor has paid, with the confirmed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStatus {
    /// Newest first; fundraiser is `None` only if the row was removed externally
    pub payments: Vec<(transaction::Model, Option<fundraiser::Model>)>,
    /// Sum of amounts of confirmed payments
    pub confirmed_total: i64,
}

/// Records a pending payment. The fundraiser's raised total is not touched.
///
/// # Errors
/// * [`Error::NotFound`] - the fundraiser does not exist
/// * [`Error::InvalidState`] - the fundraiser is not active
/// * [`Error::Forbidden`] - the donor is the fundraiser's organizer
/// * [`Error::InvalidArgument`] - the amount is out of range
///
/// The insert runs in one database transaction with a guard update on
/// `status = active`, so a payment cannot land after a concurrent finish or cancel
/// has committed.
#[instrument(skip(db, payment), fields(fundraiser_id = payment.fundraiser_id, donor_id = payment.donor_id))]
pub async fn create_payment<C>(db: &C, payment: NewPayment) -> Result<PaymentWithFundraiser>
where
    C: ConnectionTrait + TransactionTrait,
{
    let fundraiser = require_fundraiser(db, payment.fundraiser_id).await?;

    if fundraiser.status != FundraiserStatus::Active {
        return Err(not_accepting_payments(&fundraiser));
    }
    if fundraiser.creator_id == payment.donor_id {
        return Err(Error::Forbidden {
            message: "you cannot donate to your own fundraiser".to_string(),
        });
    }
    if payment.amount <= 0 {
        return Err(Error::invalid_argument(format!(
            "payment amount must be greater than zero, got {}",
            payment.amount
        )));
    }
    if payment.amount > MAX_AMOUNT {
        return Err(Error::invalid_argument(format!(
            "payment amount cannot exceed {MAX_AMOUNT}, got {}",
            payment.amount
        )));
    }

    let txn = db.begin().await?;
    let created = match insert_if_active(&txn, payment).await {
        Ok(created) => created,
        Err(e) => {
            txn.rollback().await?;
            return Err(e);
        }
    };
    txn.commit().await?;

    info!(transaction_id = created.id, amount = created.amount, "Payment pending");
    Ok(PaymentWithFundraiser {
        payment: created,
        fundraiser,
    })
}

fn not_accepting_payments(fundraiser: &fundraiser::Model) -> Error {
    Error::InvalidState {
        message: format!(
            "fundraiser \"{}\" is {} and does not accept payments",
            fundraiser.title, fundraiser.status
        ),
    }
}

/// Inserts the pending transaction if the fundraiser is still active at write time.
///
/// The no-op update takes the fundraiser's write lock before the insert; run it
/// inside a database transaction.
async fn insert_if_active<C>(db: &C, payment: NewPayment) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    let still_active = Fundraiser::update_many()
        .col_expr(
            fundraiser::Column::UpdatedAt,
            Expr::col(fundraiser::Column::UpdatedAt).into(),
        )
        .filter(fundraiser::Column::Id.eq(payment.fundraiser_id))
        .filter(fundraiser::Column::Status.eq(FundraiserStatus::Active))
        .exec(db)
        .await?;

    if still_active.rows_affected == 0 {
        let current = require_fundraiser(db, payment.fundraiser_id).await?;
        warn!(
            fundraiser_id = current.id,
            status = %current.status,
            "Fundraiser closed while the payment was being recorded"
        );
        return Err(not_accepting_payments(&current));
    }

    let model = transaction::ActiveModel {
        fundraiser_id: Set(payment.fundraiser_id),
        donor_id: Set(payment.donor_id),
        donor_username: Set(payment.donor_username),
        amount: Set(payment.amount),
        currency: Set(payment.currency),
        status: Set(TransactionStatus::Pending),
        payment_method: Set(transaction::PAYMENT_METHOD_TELEGRAM_STARS.to_string()),
        created_at: Set(chrono::Utc::now()),
        confirmed_at: Set(None),
        rejected_at: Set(None),
        notes: Set(payment.note),
        rejection_reason: Set(None),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Loads a transaction and its fundraiser and checks the settle preconditions
/// shared by confirm and reject.
async fn load_for_settlement<C>(
    db: &C,
    transaction_id: i64,
    acting_user_id: i64,
) -> Result<PaymentWithFundraiser>
where
    C: ConnectionTrait,
{
    let payment = Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Transaction",
            id: transaction_id,
        })?;
    let fundraiser = require_fundraiser(db, payment.fundraiser_id).await?;

    if fundraiser.creator_id != acting_user_id {
        return Err(Error::Forbidden {
            message: format!("only the organizer can settle transaction #{transaction_id}"),
        });
    }
    if payment.status.is_final() {
        return Err(Error::AlreadyFinalized {
            id: transaction_id,
            status: payment.status,
        });
    }

    Ok(PaymentWithFundraiser {
        payment,
        fundraiser,
    })
}

/// Re-reads a transaction after a lost compare-and-swap to report its terminal status.
async fn already_finalized<C>(db: &C, transaction_id: i64) -> Result<Error>
where
    C: ConnectionTrait,
{
    let current = Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Transaction",
            id: transaction_id,
        })?;
    Ok(Error::AlreadyFinalized {
        id: transaction_id,
        status: current.status,
    })
}

/// Organizer confirms a pending payment and the amount is added to the fundraiser.
///
/// # Errors
/// * [`Error::NotFound`] - the transaction does not exist
/// * [`Error::Forbidden`] - `acting_user_id` is not the fundraiser's organizer
/// * [`Error::AlreadyFinalized`] - the transaction was already confirmed or rejected
#[instrument(skip(db))]
pub async fn confirm_payment(
    db: &DatabaseConnection,
    transaction_id: i64,
    acting_user_id: i64,
) -> Result<PaymentWithFundraiser> {
    let PaymentWithFundraiser {
        payment,
        fundraiser,
    } = load_for_settlement(db, transaction_id, acting_user_id).await?;

    let now = chrono::Utc::now();
    let txn = db.begin().await?;

    let swapped = Transaction::update_many()
        .set(transaction::ActiveModel {
            status: Set(TransactionStatus::Confirmed),
            confirmed_at: Set(Some(now)),
            ..Default::default()
        })
        .filter(transaction::Column::Id.eq(transaction_id))
        .filter(transaction::Column::Status.eq(TransactionStatus::Pending))
        .exec(&txn)
        .await?;

    if swapped.rows_affected == 0 {
        txn.rollback().await?;
        warn!(transaction_id, "Confirmation lost the race, transaction already settled");
        return Err(already_finalized(db, transaction_id).await?);
    }

    Fundraiser::update_many()
        .col_expr(
            fundraiser::Column::Raised,
            Expr::col(fundraiser::Column::Raised).add(payment.amount),
        )
        .col_expr(fundraiser::Column::UpdatedAt, Expr::value(now))
        .filter(fundraiser::Column::Id.eq(fundraiser.id))
        .exec(&txn)
        .await?;

    let payment = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "Transaction",
            id: transaction_id,
        })?;
    let fundraiser = require_fundraiser(&txn, fundraiser.id).await?;

    txn.commit().await?;

    info!(
        transaction_id,
        fundraiser_id = fundraiser.id,
        raised = fundraiser.raised,
        "Payment confirmed"
    );
    Ok(PaymentWithFundraiser {
        payment,
        fundraiser,
    })
}

/// Organizer rejects a pending payment. The raised total is not touched.
///
/// # Errors
/// Same as [`confirm_payment`].
#[instrument(skip(db, reason))]
pub async fn reject_payment<C>(
    db: &C,
    transaction_id: i64,
    acting_user_id: i64,
    reason: Option<String>,
) -> Result<PaymentWithFundraiser>
where
    C: ConnectionTrait,
{
    let PaymentWithFundraiser { fundraiser, .. } =
        load_for_settlement(db, transaction_id, acting_user_id).await?;

    let swapped = Transaction::update_many()
        .set(transaction::ActiveModel {
            status: Set(TransactionStatus::Rejected),
            rejected_at: Set(Some(chrono::Utc::now())),
            rejection_reason: Set(reason),
            ..Default::default()
        })
        .filter(transaction::Column::Id.eq(transaction_id))
        .filter(transaction::Column::Status.eq(TransactionStatus::Pending))
        .exec(db)
        .await?;

    if swapped.rows_affected == 0 {
        return Err(already_finalized(db, transaction_id).await?);
    }

    let payment = Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Transaction",
            id: transaction_id,
        })?;

    info!(transaction_id, "Payment rejected");
    Ok(PaymentWithFundraiser {
        payment,
        fundraiser,
    })
}

/// All payments made by `donor_id`, newest first, with the confirmed total.
pub async fn get_payment_status<C>(db: &C, donor_id: i64) -> Result<PaymentStatus>
where
    C: ConnectionTrait,
{
    let payments = Transaction::find()
        .filter(transaction::Column::DonorId.eq(donor_id))
        .order_by_desc(transaction::Column::Id)
        .find_also_related(Fundraiser)
        .all(db)
        .await?;

    let confirmed_total = payments
        .iter()
        .filter(|(payment, _)| payment.status == TransactionStatus::Confirmed)
        .map(|(payment, _)| payment.amount)
        .sum();

    Ok(PaymentStatus {
        payments,
        confirmed_total,
    })
}

/// Pending payments of a fundraiser, oldest first. Organizer only.
pub async fn list_pending_payments<C>(
    db: &C,
    fundraiser_id: i64,
    acting_user_id: i64,
) -> Result<(fundraiser::Model, Vec<transaction::Model>)>
where
    C: ConnectionTrait,
{
    let fundraiser =
        crate::core::fundraiser::require_organizer(db, fundraiser_id, acting_user_id).await?;
    let pending = Transaction::find()
        .filter(transaction::Column::FundraiserId.eq(fundraiser_id))
        .filter(transaction::Column::Status.eq(TransactionStatus::Pending))
        .order_by_asc(transaction::Column::Id)
        .all(db)
        .await?;
    Ok((fundraiser, pending))
}

/// Number of confirmed payments for a fundraiser.
pub async fn count_confirmed_payments<C>(db: &C, fundraiser_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::FundraiserId.eq(fundraiser_id))
        .filter(transaction::Column::Status.eq(TransactionStatus::Confirmed))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Sum of confirmed payment amounts, computed from the transactions themselves.
pub async fn confirmed_sum<C>(db: &C, fundraiser_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let confirmed = Transaction::find()
        .filter(transaction::Column::FundraiserId.eq(fundraiser_id))
        .filter(transaction::Column::Status.eq(TransactionStatus::Confirmed))
        .all(db)
        .await?;
    Ok(confirmed.iter().map(|payment| payment.amount).sum())
}
