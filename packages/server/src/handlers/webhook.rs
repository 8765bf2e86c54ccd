use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use common::PaymentStatus;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::entity::{payment, refund};
use crate::error::{AppError, ErrorBody};
use crate::gateway::signature;
use crate::handlers::payment::apply_gateway_transition;
use crate::handlers::refund::finalize_refund_processed;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

/// Razorpay webhook envelope.
#[derive(Deserialize)]
struct WebhookEvent {
    event: String,
    #[serde(default)]
    payload: WebhookPayload,
}

#[derive(Deserialize, Default)]
struct WebhookPayload {
    payment: Option<Wrapped<PaymentEntity>>,
    refund: Option<Wrapped<RefundEntity>>,
}

#[derive(Deserialize)]
struct Wrapped<T> {
    entity: T,
}

#[derive(Deserialize)]
struct PaymentEntity {
    id: String,
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct RefundEntity {
    id: String,
}

/// Webhook acknowledgement.
#[derive(Serialize, utoipa::ToSchema)]
pub struct WebhookAck {
    /// "processed" when state changed, "ignored" otherwise.
    #[schema(example = "processed")]
    pub status: &'static str,
}

fn ack(status: &'static str) -> Json<WebhookAck> {
    Json(WebhookAck { status })
}

/// Gateway webhook sink.
#[utoipa::path(
    post,
    path = "/{gateway}",
    tag = "Webhooks",
    operation_id = "gatewayWebhook",
    summary = "Payment gateway webhook sink",
    description = "Verifies the raw-body HMAC signature before touching any state, then applies \
        the event idempotently: replaying any delivery leaves every aggregate bit-identical. \
        Unknown event kinds are acknowledged without mutation. No bearer auth; the signature is \
        the credential.",
    params(("gateway" = String, Path, description = "Gateway name; only `razorpay` is routed")),
    responses(
        (status = 200, description = "Acknowledged", body = WebhookAck),
        (status = 400, description = "Bad or missing signature (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown gateway (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers, body), fields(gateway = %gateway))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    if gateway != "razorpay" {
        return Err(AppError::NotFound(format!("Unknown gateway '{gateway}'")));
    }

    // Signature first; nothing below runs on an unauthenticated body.
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Validation("Missing webhook signature".into()))?;

    if !signature::verify(&state.config.gateway.webhook_secret, &body, provided) {
        return Err(AppError::Validation("Invalid webhook signature".into()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed webhook body: {e}")))?;

    match event.event.as_str() {
        "payment.captured" | "payment.authorized" => {
            handle_payment_event(&state, &event, PaymentStatus::Completed).await
        }
        "payment.failed" => handle_payment_event(&state, &event, PaymentStatus::Failed).await,
        "refund.created" | "refund.processed" => handle_refund_event(&state, &event).await,
        other => {
            info!(event = other, "Ignoring unrecognized webhook event kind");
            Ok(ack("ignored"))
        }
    }
}

async fn handle_payment_event(
    state: &AppState,
    event: &WebhookEvent,
    new_status: PaymentStatus,
) -> Result<Json<WebhookAck>, AppError> {
    let Some(entity) = event.payload.payment.as_ref().map(|w| &w.entity) else {
        return Err(AppError::Validation(
            "Payment event without payment payload".into(),
        ));
    };

    // First delivery can precede the client-side verify, so the row may
    // still be known only by its order id.
    let mut lookup = payment::Entity::find()
        .filter(payment::Column::GatewayPaymentId.eq(&entity.id))
        .one(&state.db)
        .await?;
    if lookup.is_none()
        && let Some(ref order_id) = entity.order_id
    {
        lookup = payment::Entity::find()
            .filter(payment::Column::GatewayOrderId.eq(order_id))
            .one(&state.db)
            .await?;
    }

    let Some(model) = lookup else {
        warn!(gateway_payment_id = %entity.id, "Webhook for unknown payment");
        return Ok(ack("ignored"));
    };

    let failure_reason = if new_status == PaymentStatus::Failed {
        entity
            .error_description
            .clone()
            .or_else(|| Some("Payment failed at gateway".to_string()))
    } else {
        None
    };

    let outcome = apply_gateway_transition(
        state,
        model.id,
        new_status,
        Some(entity.id.clone()),
        None,
        failure_reason,
    )
    .await?;

    Ok(ack(if outcome.advanced { "processed" } else { "ignored" }))
}

async fn handle_refund_event(
    state: &AppState,
    event: &WebhookEvent,
) -> Result<Json<WebhookAck>, AppError> {
    let Some(entity) = event.payload.refund.as_ref().map(|w| &w.entity) else {
        return Err(AppError::Validation(
            "Refund event without refund payload".into(),
        ));
    };

    let Some(refund_row) = refund::Entity::find()
        .filter(refund::Column::GatewayRefundId.eq(&entity.id))
        .one(&state.db)
        .await?
    else {
        warn!(gateway_refund_id = %entity.id, "Webhook for unknown refund");
        return Ok(ack("ignored"));
    };

    let finalized = finalize_refund_processed(state, refund_row.id).await?;
    Ok(ack(if finalized.is_some() {
        "processed"
    } else {
        "ignored"
    }))
}
