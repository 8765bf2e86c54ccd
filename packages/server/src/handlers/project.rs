use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::ids;
use common::{MilestoneStatus, ProjectStatus, PropertyStatus};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, ExprTrait, NullOrdering, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::catalog;
use crate::entity::construction_update::{self, UpdateAudience};
use crate::entity::{developer, milestone, project, property};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::project::*;
use crate::models::shared::{Pagination, clamp_paging};
use crate::state::AppState;
use crate::utils::access::{can_view_project_detail, is_project_developer, require_own_developer};
use crate::utils::qr::{UploadKind, format_qr};

/// Find a project by ID or return 404.
async fn find_project<C: ConnectionTrait>(db: &C, id: i32) -> Result<project::Model, AppError> {
    project::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))
}

async fn require_project_detail_access(
    state: &AppState,
    auth_user: &AuthUser,
    project_id: i32,
) -> Result<project::Model, AppError> {
    let proj = find_project(&state.db, project_id).await?;
    if !can_view_project_detail(&state.db, auth_user, &proj).await? {
        return Err(AppError::PermissionDenied);
    }
    Ok(proj)
}

/// Create a project.
#[utoipa::path(
    post,
    path = "/",
    tag = "Projects",
    operation_id = "createProject",
    summary = "Publish a new project",
    description = "Creates a project under the caller's developer profile. Builder role required.",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_project(&payload)?;
    let dev = require_own_developer(&state.db, &auth_user).await?;

    let now = Utc::now();
    let new_project = project::ActiveModel {
        developer_id: Set(dev.id),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        status: Set(ProjectStatus::Upcoming),
        project_type: Set(payload.project_type.trim().to_string()),
        city: Set(payload.city.trim().to_string()),
        locality: Set(payload.locality.trim().to_string()),
        starting_price: Set(payload.starting_price),
        total_units: Set(0),
        available_units: Set(0),
        views_count: Set(0),
        expected_completion: Set(payload.expected_completion),
        verification_score: Set(0),
        rating_avg: Set(None),
        review_count: Set(0),
        created_at: Set(now),
        ..Default::default()
    };

    let model = new_project.insert(&state.db).await?;
    Ok((StatusCode::CREATED, Json(ProjectResponse::from(model))))
}

/// List projects.
#[utoipa::path(
    get,
    path = "/",
    tag = "Projects",
    operation_id = "listProjects",
    summary = "Browse the project catalog",
    description = "Returns a filtered, ordered, paginated list of projects. The `popular` ordering \
        sorts by rating (unrated projects last), review count, then views.",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Project list", body = ProjectListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> Result<Json<ProjectListResponse>, AppError> {
    validate_project_list_query(&query)?;

    let (page, per_page) = clamp_paging(query.page, query.per_page);

    let mut base_select = project::Entity::find();

    if let Some(status) = query.status {
        base_select = base_select.filter(project::Column::Status.eq(status));
    }
    if let Some(ref project_type) = query.project_type {
        base_select = base_select.filter(project::Column::ProjectType.eq(project_type.trim()));
    }
    if let Some(ref city) = query.city {
        base_select = base_select
            .filter(Expr::col(project::Column::City).ilike(city.trim().to_string()));
    }
    if let Some(developer_id) = query.developer {
        base_select = base_select.filter(project::Column::DeveloperId.eq(developer_id));
    }
    if let Some(verified) = query.verified {
        let verified_devs = SeaQuery::select()
            .column(developer::Column::Id)
            .from(developer::Entity)
            .and_where(developer::Column::Verified.eq(verified))
            .to_owned();
        base_select = base_select.filter(project::Column::DeveloperId.in_subquery(verified_devs));
    }
    if let Some(min_price) = query.min_price {
        base_select = base_select.filter(project::Column::StartingPrice.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        base_select = base_select.filter(project::Column::StartingPrice.lte(max_price));
    }
    if let Some(ref property_types) = query.property_types {
        let types: Vec<String> = property_types
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if !types.is_empty() {
            let matching = SeaQuery::select()
                .column(property::Column::ProjectId)
                .from(property::Entity)
                .and_where(property::Column::PropertyType.is_in(types))
                .to_owned();
            base_select = base_select.filter(project::Column::Id.in_subquery(matching));
        }
    }

    let total = base_select.clone().count(&state.db).await?;

    let sort_order = if query.sort_order.as_deref() == Some("asc") {
        Order::Asc
    } else {
        Order::Desc
    };

    let select = match query.ordering.as_deref().unwrap_or("created_at") {
        "starting_price" => base_select.order_by(project::Column::StartingPrice, sort_order),
        "expected_completion" => base_select.order_by_with_nulls(
            project::Column::ExpectedCompletion,
            sort_order,
            NullOrdering::Last,
        ),
        "verification_score" => {
            base_select.order_by(project::Column::VerificationScore, sort_order)
        }
        "views_count" => base_select.order_by(project::Column::ViewsCount, sort_order),
        "popular" => base_select
            .order_by_with_nulls(project::Column::RatingAvg, Order::Desc, NullOrdering::Last)
            .order_by(project::Column::ReviewCount, Order::Desc)
            .order_by(project::Column::ViewsCount, Order::Desc),
        _ => base_select.order_by(project::Column::CreatedAt, sort_order),
    };

    let projects = select
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let total_pages = total.div_ceil(per_page);
    Ok(Json(ProjectListResponse {
        data: projects.into_iter().map(ProjectResponse::from).collect(),
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// Get a single project.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Projects",
    operation_id = "getProject",
    summary = "Project details",
    description = "Returns full details of a project and counts the view exactly once per call.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project details", body = ProjectResponse),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(project_id = %id))]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectResponse>, AppError> {
    let mut proj = find_project(&state.db, id).await?;

    // Atomic column bump: never read-modify-write the counter.
    project::Entity::update_many()
        .col_expr(
            project::Column::ViewsCount,
            Expr::col(project::Column::ViewsCount).add(1),
        )
        .filter(project::Column::Id.eq(id))
        .exec(&state.db)
        .await?;
    proj.views_count += 1;

    Ok(Json(ProjectResponse::from(proj)))
}

/// List the units of a project.
#[utoipa::path(
    get,
    path = "/{id}/properties",
    tag = "Projects",
    operation_id = "listProperties",
    summary = "List units in a project",
    description = "Visible to staff, the project's developer, and buyer-role principals.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Unit list", body = [PropertyResponse]),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(project_id = %id))]
pub async fn list_properties(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<PropertyResponse>>, AppError> {
    require_project_detail_access(&state, &auth_user, id).await?;

    let units = property::Entity::find()
        .filter(property::Column::ProjectId.eq(id))
        .order_by_asc(property::Column::UnitNumber)
        .all(&state.db)
        .await?;

    Ok(Json(units.into_iter().map(PropertyResponse::from).collect()))
}

/// Add a unit to a project.
#[utoipa::path(
    post,
    path = "/{id}/properties",
    tag = "Projects",
    operation_id = "createProperty",
    summary = "Add a unit to a project",
    description = "Builder only, own projects only. Mints the unit's QR payload and secret.",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = CreatePropertyRequest,
    responses(
        (status = 201, description = "Unit created", body = PropertyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Duplicate unit number (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(project_id = %id))]
pub async fn create_property(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreatePropertyRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_property(&payload)?;
    let dev = require_own_developer(&state.db, &auth_user).await?;

    let txn = state.db.begin().await?;

    let proj = find_project(&txn, id).await?;
    if proj.developer_id != dev.id {
        return Err(AppError::PermissionDenied);
    }

    let unit_number = payload.unit_number.trim().to_string();
    let duplicate = property::Entity::find()
        .filter(property::Column::ProjectId.eq(id))
        .filter(property::Column::UnitNumber.eq(&unit_number))
        .one(&txn)
        .await?
        .is_some();
    if duplicate {
        return Err(AppError::conflict(
            "CONFLICT",
            format!("Unit {unit_number} already exists in this project"),
        ));
    }

    let now = Utc::now();
    let new_property = property::ActiveModel {
        project_id: Set(id),
        unit_number: Set(unit_number),
        property_type: Set(payload.property_type.trim().to_string()),
        floor: Set(payload.floor),
        price: Set(payload.price),
        status: Set(PropertyStatus::Available),
        buyer_id: Set(None),
        unit_photos: Set(serde_json::Value::Array(vec![])),
        unit_videos: Set(serde_json::Value::Array(vec![])),
        qr_code_data: Set(None),
        qr_code_secret: Set(None),
        created_at: Set(now),
        ..Default::default()
    };
    let inserted = new_property.insert(&txn).await?;

    // The QR payload embeds the unit id, so it is minted after insert.
    let secret = ids::qr_secret();
    let qr_data = format_qr(UploadKind::Property, id, inserted.id, &secret[..8]);
    let mut active: property::ActiveModel = inserted.into();
    active.qr_code_data = Set(Some(qr_data));
    active.qr_code_secret = Set(Some(secret));
    let model = active.update(&txn).await?;

    catalog::refresh_unit_counters(&txn, id).await?;

    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(PropertyResponse::from(model))))
}

/// List the milestones of a project.
#[utoipa::path(
    get,
    path = "/{id}/milestones",
    tag = "Projects",
    operation_id = "listMilestones",
    summary = "List construction milestones",
    description = "Ordered by phase number. Visible to staff, the project's developer, and \
        buyer-role principals.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Milestone list", body = [MilestoneResponse]),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(project_id = %id))]
pub async fn list_milestones(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<MilestoneResponse>>, AppError> {
    require_project_detail_access(&state, &auth_user, id).await?;

    let milestones = milestone::Entity::find()
        .filter(milestone::Column::ProjectId.eq(id))
        .order_by_asc(milestone::Column::PhaseNumber)
        .all(&state.db)
        .await?;

    Ok(Json(
        milestones.into_iter().map(MilestoneResponse::from).collect(),
    ))
}

/// Add a milestone to a project.
#[utoipa::path(
    post,
    path = "/{id}/milestones",
    tag = "Projects",
    operation_id = "createMilestone",
    summary = "Add a construction milestone",
    description = "Builder only, own projects only. Mints the milestone's QR payload and secret.",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = CreateMilestoneRequest,
    responses(
        (status = 201, description = "Milestone created", body = MilestoneResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(project_id = %id))]
pub async fn create_milestone(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateMilestoneRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_milestone(&payload)?;
    let dev = require_own_developer(&state.db, &auth_user).await?;

    let txn = state.db.begin().await?;

    let proj = find_project(&txn, id).await?;
    if proj.developer_id != dev.id {
        return Err(AppError::PermissionDenied);
    }

    let now = Utc::now();
    let new_milestone = milestone::ActiveModel {
        project_id: Set(id),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        phase_number: Set(payload.phase_number),
        status: Set(MilestoneStatus::Pending),
        progress_percentage: Set(0),
        photos: Set(serde_json::Value::Array(vec![])),
        videos: Set(serde_json::Value::Array(vec![])),
        qr_code_data: Set(None),
        qr_code_secret: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let inserted = new_milestone.insert(&txn).await?;

    let secret = ids::qr_secret();
    let qr_data = format_qr(UploadKind::Milestone, id, inserted.id, &secret[..8]);
    let mut active: milestone::ActiveModel = inserted.into();
    active.qr_code_data = Set(Some(qr_data));
    active.qr_code_secret = Set(Some(secret));
    let model = active.update(&txn).await?;

    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(MilestoneResponse::from(model))))
}

/// Construction-update feed for a project.
#[utoipa::path(
    get,
    path = "/{id}/updates",
    tag = "Projects",
    operation_id = "listConstructionUpdates",
    summary = "Construction-update feed",
    description = "Staff and the project's developer see every update; buyers see project-wide \
        updates plus updates for their own units.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Update feed", body = [ConstructionUpdateResponse]),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(project_id = %id))]
pub async fn list_updates(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ConstructionUpdateResponse>>, AppError> {
    let proj = require_project_detail_access(&state, &auth_user, id).await?;

    let sees_all =
        auth_user.is_staff() || is_project_developer(&state.db, &auth_user, &proj).await?;

    let mut select =
        construction_update::Entity::find().filter(construction_update::Column::ProjectId.eq(id));

    if !sees_all {
        let owned_units: Vec<i32> = property::Entity::find()
            .filter(property::Column::ProjectId.eq(id))
            .filter(property::Column::BuyerId.eq(Some(auth_user.user_id)))
            .select_only()
            .column(property::Column::Id)
            .into_tuple()
            .all(&state.db)
            .await?;

        select = select.filter(
            Condition::any()
                .add(construction_update::Column::Audience.eq(UpdateAudience::Project))
                .add(construction_update::Column::PropertyId.is_in(owned_units)),
        );
    }

    let updates = select
        .order_by_desc(construction_update::Column::CreatedAt)
        .limit(Some(200))
        .all(&state.db)
        .await?;

    Ok(Json(
        updates
            .into_iter()
            .map(ConstructionUpdateResponse::from)
            .collect(),
    ))
}
