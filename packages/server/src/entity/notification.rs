use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A materialized notification for one user.
///
/// `channels` records the dispatch attempt per channel as a JSON array of
/// `ChannelAttempt` values: attempt once, record the outcome.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    /// Event topic that produced this notification, e.g. "booking_created".
    pub event_type: String,
    pub title: String,
    pub message: String,

    /// JSON array of `ChannelAttempt` values.
    #[sea_orm(column_type = "JsonBinary")]
    pub channels: Json,

    pub read: bool,
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

/// Outcome of one delivery attempt on one channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChannelAttempt {
    /// "email", "sms" or "push".
    pub channel: String,
    /// "sent", "failed" or "suppressed_quiet_hours".
    pub outcome: String,
}
