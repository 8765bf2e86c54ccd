use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::{PaymentStatus, RefundStatus, ids};
use sea_orm::sea_query::LockType;
use sea_orm::*;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::entity::{payment, refund};
use crate::error::{AppError, ErrorBody};
use crate::events::DomainEvent;
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::gateway::{CreateRefundRequest, GatewayError, to_minor_units};
use crate::models::payment::{InitiateRefundRequest, RefundResponse, validate_initiate_refund};
use crate::state::AppState;

/// Initiate a refund against a payment.
///
/// Creates the refund row under the payment lock, then calls the gateway
/// outside it (external RPCs never run inside a row-lock scope). A gateway
/// rejection marks the refund failed; a timeout leaves it pending for
/// reconciliation via webhook or operator retry.
pub async fn initiate_refund_for(
    state: &AppState,
    payment_id: i32,
    amount: Option<i64>,
    reason: Option<String>,
) -> Result<refund::Model, AppError> {
    let txn = state.db.begin().await?;

    let pay = payment::Entity::find_by_id(payment_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;

    if !matches!(
        pay.status,
        PaymentStatus::Completed | PaymentStatus::PartiallyRefunded
    ) {
        return Err(AppError::Invariant(format!(
            "Only completed payments can be refunded (payment is {})",
            pay.status
        )));
    }

    let gateway_payment_id = pay.gateway_payment_id.clone().ok_or_else(|| {
        AppError::Invariant("Payment has no gateway payment to refund against".into())
    })?;

    let available = pay.amount - pay.refund_amount;
    let requested = amount.unwrap_or(available);
    if requested <= 0 {
        return Err(AppError::Invariant("Nothing left to refund".into()));
    }
    if requested > available {
        return Err(AppError::conflict(
            "refund_exceeds_available",
            format!("Requested {requested} exceeds refundable {available}"),
        ));
    }

    let new_refund = refund::ActiveModel {
        refund_id: Set(ids::refund_id()),
        payment_id: Set(pay.id),
        amount: Set(requested),
        reason: Set(reason.clone()),
        status: Set(RefundStatus::Pending),
        gateway_refund_id: Set(None),
        processed_at: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = new_refund.insert(&txn).await?;

    txn.commit().await?;

    let gateway_result = state
        .gateway
        .create_refund(
            &gateway_payment_id,
            CreateRefundRequest {
                amount_minor: to_minor_units(requested),
                notes: json!({ "reason": reason, "refund_id": created.refund_id }),
            },
        )
        .await;

    match gateway_result {
        Ok(remote) => {
            let mut active: refund::ActiveModel = created.clone().into();
            active.gateway_refund_id = Set(Some(remote.id.clone()));
            let updated = active.update(&state.db).await?;

            // Instant refunds come back already processed; settle inline
            // instead of waiting for the webhook.
            if remote.status.as_deref() == Some("processed") {
                if let Some(finalized) = finalize_refund_processed(state, updated.id).await? {
                    return Ok(finalized);
                }
            }
            Ok(updated)
        }
        Err(GatewayError::Rejected { code, description }) => {
            warn!(refund_id = %created.refund_id, code = ?code, "Gateway rejected refund");
            let mut active: refund::ActiveModel = created.into();
            active.status = Set(RefundStatus::Failed);
            Ok(active.update(&state.db).await?)
        }
        Err(GatewayError::Unavailable(detail)) => Err(AppError::GatewayUnavailable(detail)),
    }
}

/// Mark a refund processed and recompute the payment's refund accounting.
///
/// Idempotent: an already-processed refund commits nothing and emits
/// nothing. Runs under the payment row lock so concurrent webhook
/// deliveries serialize.
pub async fn finalize_refund_processed(
    state: &AppState,
    refund_row_id: i32,
) -> Result<Option<refund::Model>, AppError> {
    let txn = state.db.begin().await?;

    let refund_row = refund::Entity::find_by_id(refund_row_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Refund not found".into()))?;

    let pay = payment::Entity::find_by_id(refund_row.payment_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::Internal("Refund without payment".into()))?;

    // Re-read under the lock: another delivery may have settled it already.
    let refund_row = refund::Entity::find_by_id(refund_row_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Refund not found".into()))?;
    if refund_row.status == RefundStatus::Processed {
        txn.commit().await?;
        return Ok(None);
    }

    let mut active: refund::ActiveModel = refund_row.into();
    active.status = Set(RefundStatus::Processed);
    active.processed_at = Set(Some(Utc::now()));
    let updated = active.update(&txn).await?;

    // refund_amount is the sum of processed refund rows, nothing else.
    let amounts: Vec<i64> = refund::Entity::find()
        .filter(refund::Column::PaymentId.eq(pay.id))
        .filter(refund::Column::Status.eq(RefundStatus::Processed))
        .select_only()
        .column(refund::Column::Amount)
        .into_tuple()
        .all(&txn)
        .await?;
    let refund_amount: i64 = amounts.iter().sum();

    let new_payment_status = if refund_amount >= pay.amount {
        PaymentStatus::Refunded
    } else {
        PaymentStatus::PartiallyRefunded
    };

    let mut pay_active: payment::ActiveModel = pay.clone().into();
    pay_active.refund_amount = Set(refund_amount);
    if pay.status.can_advance_to(new_payment_status) {
        pay_active.status = Set(new_payment_status);
    }
    pay_active.update(&txn).await?;

    txn.commit().await?;

    info!(
        refund_id = %updated.refund_id,
        payment_id = pay.id,
        refund_amount,
        "Refund processed"
    );
    state.events.publish(DomainEvent::RefundProcessed {
        refund_id: updated.id,
        payment_id: pay.id,
        user_id: pay.user_id,
    });

    Ok(Some(updated))
}

/// Initiate a refund.
#[utoipa::path(
    post,
    path = "/",
    tag = "Refunds",
    operation_id = "initiateRefund",
    summary = "Refund a completed payment",
    description = "Refunds the requested amount, defaulting to the un-refunded remainder. The \
        payer or staff may initiate.",
    request_body = InitiateRefundRequest,
    responses(
        (status = 201, description = "Refund initiated", body = RefundResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Payment not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Exceeds refundable amount (refund_exceeds_available)", body = ErrorBody),
        (status = 422, description = "Payment not refundable (INVARIANT_VIOLATION)", body = ErrorBody),
        (status = 502, description = "Gateway unreachable (GATEWAY_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(payment_id = payload.payment_id))]
pub async fn initiate_refund(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<InitiateRefundRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_initiate_refund(&payload)?;

    let pay = payment::Entity::find_by_id(payload.payment_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;
    if pay.user_id != auth_user.user_id && !auth_user.is_staff() {
        return Err(AppError::NotFound("Payment not found".into()));
    }

    let model =
        initiate_refund_for(&state, payload.payment_id, payload.amount, payload.reason).await?;

    Ok((StatusCode::CREATED, Json(RefundResponse::from(model))))
}
