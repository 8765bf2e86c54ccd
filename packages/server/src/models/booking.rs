use chrono::{DateTime, Utc};
use common::BookingStatus;
use serde::{Deserialize, Serialize};

use crate::entity::booking;
use crate::error::AppError;

use super::shared::Pagination;

/// Request body for creating a booking.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateBookingRequest {
    #[schema(example = 1)]
    pub property_id: i32,
    /// Token amount in rupees; defaults to 5% of the unit price.
    pub token_amount: Option<i64>,
    #[schema(example = "razorpay")]
    pub payment_method: Option<String>,
    /// Must be true.
    pub terms_accepted: bool,
}

/// Request body for cancelling a booking.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CancelBookingRequest {
    #[schema(example = "Changed my mind")]
    pub reason: String,
}

/// Query parameters for booking listing.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct BookingListQuery {
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
    /// Filter by status.
    pub status: Option<BookingStatus>,
}

/// Full booking details.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BookingResponse {
    pub id: i32,
    #[schema(example = "BKG-20260801-0F3A9C2D")]
    pub booking_number: String,
    pub property_id: i32,
    pub buyer_id: i32,
    pub property_price: i64,
    pub total_amount: i64,
    pub token_amount: i64,
    pub amount_paid: i64,
    pub amount_due: i64,
    pub status: BookingStatus,
    pub payment_method: String,
    pub token_payment_date: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub cancellation_initiated_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<booking::Model> for BookingResponse {
    fn from(m: booking::Model) -> Self {
        Self {
            id: m.id,
            booking_number: m.booking_number,
            property_id: m.property_id,
            buyer_id: m.buyer_id,
            property_price: m.property_price,
            total_amount: m.total_amount,
            token_amount: m.token_amount,
            amount_paid: m.amount_paid,
            amount_due: m.amount_due,
            status: m.status,
            payment_method: m.payment_method,
            token_payment_date: m.token_payment_date,
            completion_date: m.completion_date,
            cancellation_reason: m.cancellation_reason,
            cancellation_initiated_by: m.cancellation_initiated_by,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BookingListResponse {
    pub data: Vec<BookingResponse>,
    pub pagination: Pagination,
}

pub fn validate_create_booking(req: &CreateBookingRequest) -> Result<(), AppError> {
    if !req.terms_accepted {
        return Err(AppError::Invariant("terms_accepted must be true".into()));
    }
    if let Some(token) = req.token_amount
        && token <= 0
    {
        return Err(AppError::Invariant("token_amount must be positive".into()));
    }
    Ok(())
}

pub fn validate_cancel_booking(req: &CancelBookingRequest) -> Result<(), AppError> {
    if req.reason.trim().is_empty() {
        return Err(AppError::Validation("A cancellation reason is required".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_must_be_accepted() {
        let req = CreateBookingRequest {
            property_id: 1,
            token_amount: None,
            payment_method: None,
            terms_accepted: false,
        };
        assert!(matches!(
            validate_create_booking(&req),
            Err(AppError::Invariant(_))
        ));
    }

    #[test]
    fn token_amount_must_be_positive_when_given() {
        let req = CreateBookingRequest {
            property_id: 1,
            token_amount: Some(0),
            payment_method: None,
            terms_accepted: true,
        };
        assert!(validate_create_booking(&req).is_err());
    }

    #[test]
    fn cancellation_needs_a_reason() {
        let req = CancelBookingRequest { reason: "  ".into() };
        assert!(validate_cancel_booking(&req).is_err());
    }
}
