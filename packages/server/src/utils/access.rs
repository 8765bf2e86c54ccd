//! Ownership and visibility checks shared across handlers.

use common::UserRole;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entity::{developer, project, property};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

/// Load the developer profile owned by a user, if any.
pub async fn developer_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Option<developer::Model>, AppError> {
    Ok(developer::Entity::find()
        .filter(developer::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Require that the caller is a builder with a developer profile.
pub async fn require_own_developer<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
) -> Result<developer::Model, AppError> {
    auth_user.require_role(UserRole::Builder)?;
    developer_for_user(db, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Developer profile not found".into()))
}

/// Whether the caller is the developer behind a project.
pub async fn is_project_developer<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    project: &project::Model,
) -> Result<bool, AppError> {
    if auth_user.role != UserRole::Builder {
        return Ok(false);
    }
    let dev = developer_for_user(db, auth_user.user_id).await?;
    Ok(dev.is_some_and(|d| d.id == project.developer_id))
}

/// Whether the caller owns a property: its current buyer, or the developer
/// of its project.
pub async fn owns_property<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    prop: &property::Model,
) -> Result<bool, AppError> {
    if prop.buyer_id == Some(auth_user.user_id) {
        return Ok(true);
    }
    let project = project::Entity::find_by_id(prop.project_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("Property without project".into()))?;
    is_project_developer(db, auth_user, &project).await
}

/// Per-project detail visibility (milestones, properties, updates):
/// staff, the project's developer, or any buyer-role principal.
pub async fn can_view_project_detail<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    project: &project::Model,
) -> Result<bool, AppError> {
    match auth_user.role {
        UserRole::Staff => Ok(true),
        UserRole::Buyer => Ok(true),
        UserRole::Builder => is_project_developer(db, auth_user, project).await,
    }
}
