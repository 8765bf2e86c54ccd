use common::PaymentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A payment attempt against the gateway, optionally tied to a booking.
///
/// `refund_amount` mirrors the sum of processed refund rows and is
/// recomputed under the payment row lock whenever a refund settles.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Internal id, `TXN-YYYYMMDD-<8HEX>`.
    #[sea_orm(unique)]
    pub transaction_id: String,

    pub booking_id: Option<i32>,
    #[sea_orm(belongs_to, from = "booking_id", to = "id")]
    pub booking: BelongsTo<Option<super::booking::Entity>>,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub amount: i64,
    pub currency: String,
    pub payment_method: String,
    /// e.g. "token", "installment", "full".
    pub payment_type: String,
    pub status: PaymentStatus,

    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,

    pub refund_amount: i64,
    pub failure_reason: Option<String>,

    #[sea_orm(has_many)]
    pub refunds: HasMany<super::refund::Entity>,

    pub completed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
