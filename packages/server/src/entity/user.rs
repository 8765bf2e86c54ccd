use common::UserRole;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An authenticated principal: buyer, builder or staff.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    pub password: String,
    pub role: UserRole,

    /// Builder accounts own at most one developer profile.
    #[sea_orm(has_one)]
    pub developer: HasOne<super::developer::Entity>,

    #[sea_orm(has_many)]
    pub bookings: HasMany<super::booking::Entity>,

    #[sea_orm(has_many)]
    pub payments: HasMany<super::payment::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
