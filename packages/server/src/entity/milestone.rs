use common::MilestoneStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A construction phase of a project, ordered by `phase_number`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "milestone")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub project_id: i32,
    #[sea_orm(belongs_to, from = "project_id", to = "id")]
    pub project: HasOne<super::project::Entity>,

    pub title: String,
    pub description: String,
    pub phase_number: i32,
    pub status: MilestoneStatus,
    /// 0-100.
    pub progress_percentage: i32,

    /// JSON array of `MediaEntry` values.
    #[sea_orm(column_type = "JsonBinary")]
    pub photos: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub videos: Json,

    pub qr_code_data: Option<String>,
    pub qr_code_secret: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
