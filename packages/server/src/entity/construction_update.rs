use sea_orm::entity::prelude::*;
use sea_orm::prelude::StringLen;
use serde::{Deserialize, Serialize};

/// Who can see a construction update.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum UpdateAudience {
    /// All buyers holding units in the project.
    #[sea_orm(string_value = "project")]
    Project,
    /// Only the buyer of the referenced property.
    #[sea_orm(string_value = "property_owner")]
    PropertyOwner,
}

/// A feed entry projected from an evidence upload. The entity media lists
/// remain the source of truth; this row is presentation only.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "construction_update")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub project_id: i32,
    #[sea_orm(belongs_to, from = "project_id", to = "id")]
    pub project: HasOne<super::project::Entity>,

    pub milestone_id: Option<i32>,
    #[sea_orm(belongs_to, from = "milestone_id", to = "id")]
    pub milestone: BelongsTo<Option<super::milestone::Entity>>,

    pub property_id: Option<i32>,
    #[sea_orm(belongs_to, from = "property_id", to = "id")]
    pub property: BelongsTo<Option<super::property::Entity>>,

    pub title: String,
    pub body: String,
    /// Snapshot of the `MediaEntry` values attached by the upload.
    #[sea_orm(column_type = "JsonBinary")]
    pub media: Json,
    pub audience: UpdateAudience,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
