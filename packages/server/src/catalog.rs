//! Property status mutation and derived project counters.
//!
//! Property status is a projection of the bookings against the unit; the
//! booking engine and the property-create path are the only callers here.
//! Counters are recomputed from property rows inside the caller's
//! transaction, never incremented in place.

use common::PropertyStatus;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};

use crate::entity::{project, property};
use crate::error::AppError;

/// Set a property's status and current buyer, then refresh the parent
/// project's unit counters. Must run inside the caller's transaction so the
/// counter can never drift from the rows it is derived from.
pub async fn set_property_status<C: ConnectionTrait>(
    conn: &C,
    prop: property::Model,
    new_status: PropertyStatus,
    buyer_id: Option<i32>,
) -> Result<property::Model, AppError> {
    let project_id = prop.project_id;

    let mut active: property::ActiveModel = prop.into();
    active.status = Set(new_status);
    active.buyer_id = Set(buyer_id);
    let updated = active.update(conn).await?;

    refresh_unit_counters(conn, project_id).await?;

    Ok(updated)
}

/// Recompute `total_units` and `available_units` for a project from its
/// property rows.
pub async fn refresh_unit_counters<C: ConnectionTrait>(
    conn: &C,
    project_id: i32,
) -> Result<(), AppError> {
    let total = property::Entity::find()
        .filter(property::Column::ProjectId.eq(project_id))
        .count(conn)
        .await?;

    let available = property::Entity::find()
        .filter(property::Column::ProjectId.eq(project_id))
        .filter(property::Column::Status.eq(PropertyStatus::Available))
        .count(conn)
        .await?;

    project::Entity::update_many()
        .col_expr(project::Column::TotalUnits, Expr::value(total as i32))
        .col_expr(
            project::Column::AvailableUnits,
            Expr::value(available as i32),
        )
        .filter(project::Column::Id.eq(project_id))
        .exec(conn)
        .await?;

    Ok(())
}
