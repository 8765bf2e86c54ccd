use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-user notification settings. Absence of a row means everything is
/// enabled.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification_preference")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub push_enabled: bool,

    /// Local hour [0, 24) at which quiet hours start, NULL for none.
    pub quiet_hours_start: Option<i32>,
    /// Local hour [0, 24) at which quiet hours end.
    pub quiet_hours_end: Option<i32>,

    /// JSON array of disabled event types.
    #[sea_orm(column_type = "JsonBinary")]
    pub disabled_types: Json,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
