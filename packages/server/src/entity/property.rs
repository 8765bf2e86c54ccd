use common::PropertyStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single unit within a project.
///
/// `status` is a projection of the bookings against the unit; the booking
/// engine is its sole writer. Media lists hold `MediaEntry` JSON arrays.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "property")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub project_id: i32,
    #[sea_orm(belongs_to, from = "project_id", to = "id")]
    pub project: HasOne<super::project::Entity>,

    /// Unique within the parent project; enforced on create.
    pub unit_number: String,
    pub property_type: String,
    pub floor: Option<i32>,
    pub price: i64,
    pub status: PropertyStatus,

    /// The buyer holding the unit while a booking is active, NULL otherwise.
    pub buyer_id: Option<i32>,
    #[sea_orm(belongs_to, from = "buyer_id", to = "id")]
    pub buyer: BelongsTo<Option<super::user::Entity>>,

    /// JSON array of `MediaEntry` values.
    #[sea_orm(column_type = "JsonBinary")]
    pub unit_photos: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub unit_videos: Json,

    /// Payload printed into the on-site QR code.
    pub qr_code_data: Option<String>,
    /// Per-unit secret; its 32-char prefix is the upload token.
    pub qr_code_secret: Option<String>,

    #[sea_orm(has_many)]
    pub bookings: HasMany<super::booking::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
