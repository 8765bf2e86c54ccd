use common::RefundStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single refund against a completed payment.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "refund")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// `REF-YYYYMMDD-<8HEX>`.
    #[sea_orm(unique)]
    pub refund_id: String,

    pub payment_id: i32,
    #[sea_orm(belongs_to, from = "payment_id", to = "id")]
    pub payment: HasOne<super::payment::Entity>,

    pub amount: i64,
    pub reason: Option<String>,
    pub status: RefundStatus,
    pub gateway_refund_id: Option<String>,

    pub processed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
