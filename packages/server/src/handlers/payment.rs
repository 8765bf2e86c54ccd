use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::{BookingStatus, PaymentStatus, ids};
use sea_orm::sea_query::LockType;
use sea_orm::*;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::entity::{booking, payment};
use crate::error::{AppError, ErrorBody};
use crate::events::DomainEvent;
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::gateway::{CreateOrderRequest, GatewayError, map_gateway_status, to_minor_units};
use crate::models::payment::*;
use crate::state::AppState;

/// Find a payment by ID or return 404.
pub async fn find_payment<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<payment::Model, AppError> {
    payment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".into()))
}

/// Outcome of a monotone gateway transition.
pub struct TransitionOutcome {
    pub model: payment::Model,
    /// False when the transition was a replay or a would-be downgrade.
    pub advanced: bool,
}

/// Apply a gateway-driven status transition under the payment row lock.
///
/// The transition predicate is monotone: replays and downgrades commit
/// nothing and emit nothing, which is what makes webhook handling
/// idempotent. Events are published after commit; subscribers recompute
/// from the store, so cross-aggregate delivery races are benign.
pub async fn apply_gateway_transition(
    state: &AppState,
    payment_row_id: i32,
    new_status: PaymentStatus,
    gateway_payment_id: Option<String>,
    gateway_signature: Option<String>,
    failure_reason: Option<String>,
) -> Result<TransitionOutcome, AppError> {
    let txn = state.db.begin().await?;

    let model = payment::Entity::find_by_id(payment_row_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;

    if !model.status.can_advance_to(new_status) {
        txn.commit().await?;
        return Ok(TransitionOutcome {
            model,
            advanced: false,
        });
    }

    let mut active: payment::ActiveModel = model.into();
    active.status = Set(new_status);
    if let Some(gp) = gateway_payment_id {
        active.gateway_payment_id = Set(Some(gp));
    }
    if let Some(sig) = gateway_signature {
        active.gateway_signature = Set(Some(sig));
    }
    if let Some(reason) = failure_reason {
        active.failure_reason = Set(Some(reason));
    }
    if new_status == PaymentStatus::Completed {
        active.completed_at = Set(Some(Utc::now()));
    }
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    match new_status {
        PaymentStatus::Completed => state.events.publish(DomainEvent::PaymentCompleted {
            payment_id: updated.id,
            booking_id: updated.booking_id,
            user_id: updated.user_id,
        }),
        PaymentStatus::Failed => state.events.publish(DomainEvent::PaymentFailed {
            payment_id: updated.id,
            booking_id: updated.booking_id,
            user_id: updated.user_id,
        }),
        _ => {}
    }

    Ok(TransitionOutcome {
        model: updated,
        advanced: true,
    })
}

/// Create a payment and, for gateway methods, the corresponding order.
#[utoipa::path(
    post,
    path = "/",
    tag = "Payments",
    operation_id = "createPayment",
    summary = "Create a payment",
    description = "Creates a pending payment and a gateway order. A gateway rejection marks the \
        payment failed (HTTP 201 with the failed row, never 5xx); a gateway timeout returns 502 \
        and leaves the payment pending.",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment created", body = PaymentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Booking not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Booking not active (booking_not_active)", body = ErrorBody),
        (status = 422, description = "Bad amount (INVARIANT_VIOLATION)", body = ErrorBody),
        (status = 502, description = "Gateway unreachable (GATEWAY_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(booking_id = ?payload.booking_id))]
pub async fn create_payment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_payment(&payload)?;

    let mut booking_number = None;
    if let Some(booking_id) = payload.booking_id {
        let model = booking::Entity::find_by_id(booking_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;
        if model.buyer_id != auth_user.user_id && !auth_user.is_staff() {
            return Err(AppError::NotFound("Booking not found".into()));
        }
        if model.status == BookingStatus::Cancelled {
            return Err(AppError::conflict(
                "booking_not_active",
                "Cannot pay against a cancelled booking",
            ));
        }
        booking_number = Some(model.booking_number);
    }

    let currency = payload.currency.unwrap_or_else(|| "INR".to_string());
    let payment_method = payload.payment_method.trim().to_string();
    let transaction_id = ids::transaction_id();

    let new_payment = payment::ActiveModel {
        transaction_id: Set(transaction_id.clone()),
        booking_id: Set(payload.booking_id),
        user_id: Set(auth_user.user_id),
        amount: Set(payload.amount),
        currency: Set(currency.clone()),
        payment_method: Set(payment_method.clone()),
        payment_type: Set(payload.payment_type.unwrap_or_else(|| "token".to_string())),
        status: Set(PaymentStatus::Pending),
        gateway_order_id: Set(None),
        gateway_payment_id: Set(None),
        gateway_signature: Set(None),
        refund_amount: Set(0),
        failure_reason: Set(None),
        completed_at: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let model = new_payment.insert(&state.db).await?;

    if payment_method != "razorpay" {
        return Ok((StatusCode::CREATED, Json(PaymentResponse::from(model))));
    }

    let order = state
        .gateway
        .create_order(CreateOrderRequest {
            amount_minor: to_minor_units(model.amount),
            currency,
            receipt: transaction_id,
            notes: json!({ "booking_number": booking_number }),
        })
        .await;

    let model = match order {
        Ok(order) => {
            let mut active: payment::ActiveModel = model.into();
            active.gateway_order_id = Set(Some(order.id));
            active.update(&state.db).await?
        }
        Err(GatewayError::Rejected { code, description }) => {
            warn!(code = ?code, "Gateway rejected order creation");
            let mut active: payment::ActiveModel = model.into();
            active.status = Set(PaymentStatus::Failed);
            active.failure_reason = Set(Some(description));
            active.update(&state.db).await?
        }
        Err(GatewayError::Unavailable(detail)) => {
            // Leave the payment pending; the buyer can retry once the
            // gateway is reachable again.
            return Err(AppError::GatewayUnavailable(detail));
        }
    };

    Ok((StatusCode::CREATED, Json(PaymentResponse::from(model))))
}

/// Get a single payment.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Payments",
    operation_id = "getPayment",
    summary = "Payment details",
    description = "Visible to the payer and staff. A payment stuck in `processing` is reconciled \
        against the gateway on read.",
    params(("id" = i32, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment details", body = PaymentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Payment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(payment_id = %id))]
pub async fn get_payment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PaymentResponse>, AppError> {
    let model = find_payment(&state.db, id).await?;
    if model.user_id != auth_user.user_id && !auth_user.is_staff() {
        return Err(AppError::NotFound("Payment not found".into()));
    }

    // On-demand reconciliation of orphaned processing payments.
    if model.status == PaymentStatus::Processing
        && let Some(ref gateway_payment_id) = model.gateway_payment_id
        && let Ok(remote) = state.gateway.fetch_payment(gateway_payment_id).await
        && let Some(new_status) = map_gateway_status(&remote.status)
    {
        let outcome = apply_gateway_transition(
            &state,
            model.id,
            new_status,
            None,
            None,
            remote.error_description,
        )
        .await?;
        if outcome.advanced {
            info!(payment_id = model.id, status = %new_status, "Reconciled processing payment");
        }
        return Ok(Json(PaymentResponse::from(outcome.model)));
    }

    Ok(Json(PaymentResponse::from(model)))
}

/// Client-side payment verification.
#[utoipa::path(
    post,
    path = "/{id}/verify",
    tag = "Payments",
    operation_id = "verifyPayment",
    summary = "Verify a checkout callback",
    description = "Verifies the HMAC signature the hosted checkout hands to the client, fetches \
        the payment from the gateway and applies the resulting state. Concurrent webhook delivery \
        is safe: the transition is monotone under the payment row lock.",
    params(("id" = i32, Path, description = "Payment ID")),
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Verified payment", body = PaymentResponse),
        (status = 400, description = "Bad signature or order mismatch (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Payment not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Gateway unreachable (GATEWAY_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(payment_id = %id))]
pub async fn verify_payment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<VerifyPaymentRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    validate_verify_payment(&payload)?;

    let model = find_payment(&state.db, id).await?;
    if model.user_id != auth_user.user_id && !auth_user.is_staff() {
        return Err(AppError::NotFound("Payment not found".into()));
    }

    if model.gateway_order_id.as_deref() != Some(payload.gateway_order_id.as_str()) {
        return Err(AppError::Validation(
            "gateway_order_id does not match this payment".into(),
        ));
    }

    let signature_valid = crate::gateway::signature::verify_payment_signature(
        &state.config.gateway.key_secret,
        &payload.gateway_order_id,
        &payload.gateway_payment_id,
        &payload.gateway_signature,
    );
    if !signature_valid {
        return Err(AppError::Validation("Invalid payment signature".into()));
    }

    let remote = state
        .gateway
        .fetch_payment(&payload.gateway_payment_id)
        .await
        .map_err(|e| match e {
            GatewayError::Unavailable(detail) => AppError::GatewayUnavailable(detail),
            GatewayError::Rejected { description, .. } => AppError::Validation(description),
        })?;

    let Some(new_status) = map_gateway_status(&remote.status) else {
        // Unknown gateway state: record the ids, change nothing else.
        return Ok(Json(PaymentResponse::from(model)));
    };

    let outcome = apply_gateway_transition(
        &state,
        model.id,
        new_status,
        Some(payload.gateway_payment_id),
        Some(payload.gateway_signature),
        remote.error_description,
    )
    .await?;

    Ok(Json(PaymentResponse::from(outcome.model)))
}
