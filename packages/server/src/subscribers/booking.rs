//! Booking settlement: the consumer side of the payment → booking flow.
//!
//! On every `PaymentCompleted` the booking's aggregates are recomputed from
//! the payment rows under the booking row lock, and the ordered advance
//! rules are applied. The aggregate is a pure function of payment rows, so
//! replaying a delivery is a no-op.

use chrono::Utc;
use common::{BookingStatus, PaymentStatus, PropertyStatus};
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::catalog;
use crate::entity::{booking, payment, property};
use crate::error::AppError;
use crate::events::DomainEvent;
use crate::state::AppState;
use crate::utils::settlement::{self, Advance, SettlementInput};

/// Consume payment events and settle the affected bookings.
pub async fn run(state: AppState) {
    let mut rx = state.events.subscribe();
    info!("Starting booking settlement subscriber");

    loop {
        match rx.recv().await {
            Ok(DomainEvent::PaymentCompleted {
                booking_id: Some(booking_id),
                ..
            }) => {
                if let Err(e) = settle_booking(&state, booking_id).await {
                    error!(booking_id, error = ?e, "Failed to settle booking after payment");
                }
            }
            // A processed refund drops the payment out of the completed set;
            // the booking's aggregates must follow.
            Ok(DomainEvent::RefundProcessed { payment_id, .. }) => {
                if let Err(e) = settle_after_refund(&state, payment_id).await {
                    error!(payment_id, error = ?e, "Failed to resettle booking after refund");
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Settlement subscriber lagged behind the bus");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn settle_after_refund(state: &AppState, payment_id: i32) -> Result<(), AppError> {
    let Some(pay) = payment::Entity::find_by_id(payment_id).one(&state.db).await? else {
        return Ok(());
    };
    match pay.booking_id {
        Some(booking_id) => settle_booking(state, booking_id).await,
        None => Ok(()),
    }
}

/// Recompute a booking's money aggregates and apply the advance rules.
pub async fn settle_booking(state: &AppState, booking_id: i32) -> Result<(), AppError> {
    let txn = state.db.begin().await?;

    let model = booking::Entity::find_by_id(booking_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {booking_id} not found")))?;

    let amounts: Vec<i64> = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(Some(booking_id)))
        .filter(payment::Column::Status.eq(PaymentStatus::Completed))
        .select_only()
        .column(payment::Column::Amount)
        .into_tuple()
        .all(&txn)
        .await?;
    let amount_paid: i64 = amounts.iter().sum();
    let amount_due = model.total_amount - amount_paid;

    let advance = settlement::advance_for(&SettlementInput {
        status: model.status,
        total_amount: model.total_amount,
        token_amount: model.token_amount,
        amount_paid,
    });

    // Replayed delivery: aggregates already match and no rule fires.
    if advance.is_none() && model.amount_paid == amount_paid && model.amount_due == amount_due {
        txn.commit().await?;
        return Ok(());
    }

    let old_status = model.status;
    let buyer_id = model.buyer_id;
    let property_id = model.property_id;
    let now = Utc::now();

    let mut active: booking::ActiveModel = model.into();
    active.amount_paid = Set(amount_paid);
    active.amount_due = Set(amount_due);
    active.updated_at = Set(now);
    match advance {
        Some(Advance::TokenPaid) => {
            active.status = Set(BookingStatus::TokenPaid);
            active.token_payment_date = Set(Some(now));
        }
        Some(Advance::Completed) => {
            active.status = Set(BookingStatus::Completed);
            active.completion_date = Set(Some(now));
        }
        Some(Advance::PaymentInProgress) => {
            active.status = Set(BookingStatus::PaymentInProgress);
        }
        None => {}
    }
    active.update(&txn).await?;

    // A fully paid booking marks the unit sold; the buyer stays on it.
    if advance == Some(Advance::Completed) {
        let prop = property::Entity::find_by_id(property_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::Internal("Booking without property".into()))?;
        catalog::set_property_status(&txn, prop, PropertyStatus::Sold, Some(buyer_id)).await?;
    }

    txn.commit().await?;

    if let Some(advance) = advance {
        let new_status = advance.target_status();
        info!(
            booking_id,
            old = %old_status,
            new = %new_status,
            amount_paid,
            "Booking advanced"
        );
        state.events.publish(DomainEvent::BookingStateChanged {
            booking_id,
            buyer_id,
            old: old_status,
            new: new_status,
        });
    }

    Ok(())
}
