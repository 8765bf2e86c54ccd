use common::ProjectStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A real-estate project published by a developer.
///
/// `total_units` and `available_units` are derived counters, recomputed from
/// property rows on every property mutation; `views_count` is bumped
/// atomically on detail reads.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub developer_id: i32,
    #[sea_orm(belongs_to, from = "developer_id", to = "id")]
    pub developer: HasOne<super::developer::Entity>,

    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    /// e.g. "apartment", "villa", "plot".
    pub project_type: String,
    pub city: String,
    pub locality: String,
    pub starting_price: i64,

    pub total_units: i32,
    pub available_units: i32,
    pub views_count: i64,

    pub expected_completion: Option<DateTimeUtc>,
    pub verification_score: i32,
    /// Fed by the review service; only used for the `popular` ordering.
    pub rating_avg: Option<f64>,
    pub review_count: i32,

    #[sea_orm(has_many)]
    pub properties: HasMany<super::property::Entity>,

    #[sea_orm(has_many)]
    pub milestones: HasMany<super::milestone::Entity>,

    #[sea_orm(has_many)]
    pub construction_updates: HasMany<super::construction_update::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
