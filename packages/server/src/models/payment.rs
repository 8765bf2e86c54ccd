use chrono::{DateTime, Utc};
use common::{PaymentStatus, RefundStatus};
use serde::{Deserialize, Serialize};

use crate::entity::{payment, refund};
use crate::error::AppError;

use super::shared::validate_amount;

/// Request body for creating a payment.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePaymentRequest {
    pub booking_id: Option<i32>,
    /// Amount in rupees.
    #[schema(example = 250000)]
    pub amount: i64,
    /// Defaults to INR.
    pub currency: Option<String>,
    #[schema(example = "razorpay")]
    pub payment_method: String,
    /// e.g. "token", "installment", "full". Defaults to "token".
    pub payment_type: Option<String>,
}

/// Request body for client-side payment verification.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct VerifyPaymentRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    /// Hex HMAC-SHA256 over `"{order_id}|{payment_id}"`.
    pub gateway_signature: String,
}

/// Request body for initiating a refund.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct InitiateRefundRequest {
    pub payment_id: i32,
    /// Rupees; defaults to the un-refunded remainder of the payment.
    pub amount: Option<i64>,
    pub reason: Option<String>,
}

/// Full payment details.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    #[schema(example = "TXN-20260801-7B2F91C4")]
    pub transaction_id: String,
    pub booking_id: Option<i32>,
    pub user_id: i32,
    pub amount: i64,
    pub currency: String,
    pub payment_method: String,
    pub payment_type: String,
    pub status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub refund_amount: i64,
    pub failure_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(m: payment::Model) -> Self {
        Self {
            id: m.id,
            transaction_id: m.transaction_id,
            booking_id: m.booking_id,
            user_id: m.user_id,
            amount: m.amount,
            currency: m.currency,
            payment_method: m.payment_method,
            payment_type: m.payment_type,
            status: m.status,
            gateway_order_id: m.gateway_order_id,
            gateway_payment_id: m.gateway_payment_id,
            refund_amount: m.refund_amount,
            failure_reason: m.failure_reason,
            completed_at: m.completed_at,
            created_at: m.created_at,
        }
    }
}

/// Full refund details.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RefundResponse {
    pub id: i32,
    #[schema(example = "REF-20260801-3C8D02AF")]
    pub refund_id: String,
    pub payment_id: i32,
    pub amount: i64,
    pub reason: Option<String>,
    pub status: RefundStatus,
    pub gateway_refund_id: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<refund::Model> for RefundResponse {
    fn from(m: refund::Model) -> Self {
        Self {
            id: m.id,
            refund_id: m.refund_id,
            payment_id: m.payment_id,
            amount: m.amount,
            reason: m.reason,
            status: m.status,
            gateway_refund_id: m.gateway_refund_id,
            processed_at: m.processed_at,
            created_at: m.created_at,
        }
    }
}

pub fn validate_create_payment(req: &CreatePaymentRequest) -> Result<(), AppError> {
    validate_amount(req.amount, "amount")?;
    if req.payment_method.trim().is_empty() {
        return Err(AppError::Validation("payment_method is required".into()));
    }
    Ok(())
}

pub fn validate_verify_payment(req: &VerifyPaymentRequest) -> Result<(), AppError> {
    if req.gateway_order_id.trim().is_empty()
        || req.gateway_payment_id.trim().is_empty()
        || req.gateway_signature.trim().is_empty()
    {
        return Err(AppError::Validation(
            "gateway_order_id, gateway_payment_id and gateway_signature are required".into(),
        ));
    }
    Ok(())
}

pub fn validate_initiate_refund(req: &InitiateRefundRequest) -> Result<(), AppError> {
    if let Some(amount) = req.amount {
        validate_amount(amount, "amount")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_amount_must_be_positive() {
        let req = CreatePaymentRequest {
            booking_id: None,
            amount: 0,
            currency: None,
            payment_method: "razorpay".into(),
            payment_type: None,
        };
        assert!(matches!(
            validate_create_payment(&req),
            Err(AppError::Invariant(_))
        ));
    }

    #[test]
    fn negative_refund_rejected() {
        let req = InitiateRefundRequest {
            payment_id: 1,
            amount: Some(-100),
            reason: None,
        };
        assert!(validate_initiate_refund(&req).is_err());
    }

    #[test]
    fn verify_needs_all_three_fields() {
        let req = VerifyPaymentRequest {
            gateway_order_id: "order_x".into(),
            gateway_payment_id: "".into(),
            gateway_signature: "ab12".into(),
        };
        assert!(validate_verify_payment(&req).is_err());
    }
}
