use common::BookingStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A buyer's reservation of a property.
///
/// `amount_paid` and `amount_due` are caches of the payment-row aggregate;
/// the settlement path recomputes both inside each state-changing
/// transaction, so they can never drift from the payment table.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub booking_number: String,

    pub property_id: i32,
    #[sea_orm(belongs_to, from = "property_id", to = "id")]
    pub property: HasOne<super::property::Entity>,

    pub buyer_id: i32,
    #[sea_orm(belongs_to, from = "buyer_id", to = "id")]
    pub buyer: HasOne<super::user::Entity>,

    /// Property price captured at booking time.
    pub property_price: i64,
    pub total_amount: i64,
    pub token_amount: i64,
    pub amount_paid: i64,
    /// Always `total_amount - amount_paid`.
    pub amount_due: i64,

    pub status: BookingStatus,
    pub payment_method: String,
    pub terms_accepted: bool,

    pub token_payment_date: Option<DateTimeUtc>,
    pub completion_date: Option<DateTimeUtc>,
    pub cancellation_reason: Option<String>,
    /// "buyer", "builder" or "staff".
    pub cancellation_initiated_by: Option<String>,

    #[sea_orm(has_many)]
    pub payments: HasMany<super::payment::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
