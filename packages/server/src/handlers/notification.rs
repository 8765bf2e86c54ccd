use axum::Json;
use axum::extract::{Path, Query, State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::notification;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::notification::{NotificationListQuery, NotificationListResponse, NotificationResponse};
use crate::models::shared::{Pagination, clamp_paging};
use crate::state::AppState;

/// List the caller's notifications.
#[utoipa::path(
    get,
    path = "/",
    tag = "Notifications",
    operation_id = "listNotifications",
    summary = "List notifications",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Notification list", body = NotificationListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_notifications(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<NotificationListResponse>, AppError> {
    let (page, per_page) = clamp_paging(query.page, query.per_page);

    let mut base_select =
        notification::Entity::find().filter(notification::Column::UserId.eq(auth_user.user_id));
    if query.unread == Some(true) {
        base_select = base_select.filter(notification::Column::Read.eq(false));
    }

    let total = base_select.clone().count(&state.db).await?;

    let rows = base_select
        .order_by_desc(notification::Column::CreatedAt)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let total_pages = total.div_ceil(per_page);
    Ok(Json(NotificationListResponse {
        data: rows.into_iter().map(NotificationResponse::from).collect(),
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// Mark a notification read.
#[utoipa::path(
    post,
    path = "/{id}/read",
    tag = "Notifications",
    operation_id = "markNotificationRead",
    summary = "Mark a notification read",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Updated notification", body = NotificationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Notification not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(notification_id = %id))]
pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<NotificationResponse>, AppError> {
    let row = notification::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .filter(|n| n.user_id == auth_user.user_id)
        .ok_or_else(|| AppError::NotFound("Notification not found".into()))?;

    if row.read {
        return Ok(Json(NotificationResponse::from(row)));
    }

    let mut active: notification::ActiveModel = row.into();
    active.read = Set(true);
    let updated = active.update(&state.db).await?;

    Ok(Json(NotificationResponse::from(updated)))
}
