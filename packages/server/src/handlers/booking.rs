use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::{BookingStatus, PaymentStatus, PropertyStatus, UserRole, ids};
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::{instrument, warn};

use crate::catalog;
use crate::entity::{booking, payment, project, property};
use crate::error::{AppError, ErrorBody};
use crate::events::DomainEvent;
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::refund::initiate_refund_for;
use crate::models::booking::*;
use crate::models::shared::{Pagination, clamp_paging};
use crate::state::AppState;
use crate::utils::access::is_project_developer;
use crate::utils::settlement;

/// Denominator of the default token amount: 5% of the unit price.
const TOKEN_FRACTION: i64 = 20;

/// Find a booking by ID or return 404.
async fn find_booking<C: ConnectionTrait>(db: &C, id: i32) -> Result<booking::Model, AppError> {
    booking::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".into()))
}

/// Whether any booking other than `except` holds this property.
async fn other_active_booking_exists<C: ConnectionTrait>(
    db: &C,
    property_id: i32,
    except: i32,
) -> Result<bool, AppError> {
    let count = booking::Entity::find()
        .filter(booking::Column::PropertyId.eq(property_id))
        .filter(booking::Column::Id.ne(except))
        .filter(booking::Column::Status.is_in(BookingStatus::ACTIVE.to_vec()))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Create a booking: the atomic check-and-reserve of a unit.
#[utoipa::path(
    post,
    path = "/",
    tag = "Bookings",
    operation_id = "createBooking",
    summary = "Reserve a unit",
    description = "Creates a pending booking and marks the unit booked, atomically. Of two \
        concurrent requests for the same unit, exactly one succeeds; the other receives 409 \
        `property_unavailable`.",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Property not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Unit taken (property_unavailable, duplicate_booking)", body = ErrorBody),
        (status = 422, description = "Terms not accepted or bad amount (INVARIANT_VIOLATION)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(property_id = payload.property_id))]
pub async fn create_booking(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_role(UserRole::Buyer)?;
    validate_create_booking(&payload)?;

    let txn = state.db.begin().await?;

    // Row lock makes the status check and the reservation one atomic step.
    let prop = property::Entity::find_by_id(payload.property_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Property not found".into()))?;

    if prop.status != PropertyStatus::Available {
        return Err(AppError::conflict(
            "property_unavailable",
            "This unit is not available for booking",
        ));
    }

    let duplicate = booking::Entity::find()
        .filter(booking::Column::PropertyId.eq(prop.id))
        .filter(booking::Column::BuyerId.eq(auth_user.user_id))
        .filter(booking::Column::Status.is_in(BookingStatus::ACTIVE.to_vec()))
        .one(&txn)
        .await?
        .is_some();
    if duplicate {
        return Err(AppError::conflict(
            "duplicate_booking",
            "You already have an active booking on this unit",
        ));
    }

    let total_amount = prop.price;
    let token_amount = payload
        .token_amount
        .unwrap_or(total_amount / TOKEN_FRACTION);
    if token_amount > total_amount {
        return Err(AppError::Invariant(
            "token_amount must not exceed the unit price".into(),
        ));
    }

    let now = Utc::now();
    let new_booking = booking::ActiveModel {
        booking_number: Set(ids::booking_number()),
        property_id: Set(prop.id),
        buyer_id: Set(auth_user.user_id),
        property_price: Set(prop.price),
        total_amount: Set(total_amount),
        token_amount: Set(token_amount),
        amount_paid: Set(0),
        amount_due: Set(total_amount),
        status: Set(BookingStatus::Pending),
        payment_method: Set(payload
            .payment_method
            .unwrap_or_else(|| "razorpay".to_string())),
        terms_accepted: Set(true),
        token_payment_date: Set(None),
        completion_date: Set(None),
        cancellation_reason: Set(None),
        cancellation_initiated_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let model = new_booking.insert(&txn).await?;

    let property_id = prop.id;
    catalog::set_property_status(&txn, prop, PropertyStatus::Booked, Some(auth_user.user_id))
        .await?;

    txn.commit().await?;

    state.events.publish(DomainEvent::BookingCreated {
        booking_id: model.id,
        property_id,
        buyer_id: model.buyer_id,
    });

    Ok((StatusCode::CREATED, Json(BookingResponse::from(model))))
}

/// List the caller's bookings.
#[utoipa::path(
    get,
    path = "/",
    tag = "Bookings",
    operation_id = "listBookings",
    summary = "List bookings",
    description = "Buyers and builders see their own bookings; staff see all.",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Booking list", body = BookingListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_bookings(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<BookingListResponse>, AppError> {
    let (page, per_page) = clamp_paging(query.page, query.per_page);

    let mut base_select = booking::Entity::find();
    if !auth_user.is_staff() {
        base_select = base_select.filter(booking::Column::BuyerId.eq(auth_user.user_id));
    }
    if let Some(status) = query.status {
        base_select = base_select.filter(booking::Column::Status.eq(status));
    }

    let total = base_select.clone().count(&state.db).await?;

    let bookings = base_select
        .order_by_desc(booking::Column::CreatedAt)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let total_pages = total.div_ceil(per_page);
    Ok(Json(BookingListResponse {
        data: bookings.into_iter().map(BookingResponse::from).collect(),
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// Get a single booking.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Bookings",
    operation_id = "getBooking",
    summary = "Booking details",
    description = "Visible to the buyer, the developer of the unit's project, and staff.",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking details", body = BookingResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Booking not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(booking_id = %id))]
pub async fn get_booking(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BookingResponse>, AppError> {
    let model = find_booking(&state.db, id).await?;
    require_booking_access(&state, &auth_user, &model).await?;
    Ok(Json(BookingResponse::from(model)))
}

async fn require_booking_access(
    state: &AppState,
    auth_user: &AuthUser,
    model: &booking::Model,
) -> Result<(), AppError> {
    if auth_user.is_staff() || model.buyer_id == auth_user.user_id {
        return Ok(());
    }

    let prop = property::Entity::find_by_id(model.property_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("Booking without property".into()))?;
    let proj = project::Entity::find_by_id(prop.project_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("Property without project".into()))?;

    if is_project_developer(&state.db, auth_user, &proj).await? {
        return Ok(());
    }
    // 404 rather than 403: don't leak booking existence.
    Err(AppError::NotFound("Booking not found".into()))
}

/// Cancel a booking.
#[utoipa::path(
    post,
    path = "/{id}/cancel",
    tag = "Bookings",
    operation_id = "cancelBooking",
    summary = "Cancel a booking",
    description = "Moves any non-terminal booking to cancelled. Releases the unit unless another \
        active booking holds it, and auto-initiates a refund of the amount paid when completed \
        payments exist.",
    params(("id" = i32, Path, description = "Booking ID")),
    request_body = CancelBookingRequest,
    responses(
        (status = 200, description = "Booking cancelled", body = BookingResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Booking not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already terminal (booking_not_active)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(booking_id = %id))]
pub async fn cancel_booking(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CancelBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    validate_cancel_booking(&payload)?;

    let txn = state.db.begin().await?;

    let model = booking::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;

    require_booking_access(&state, &auth_user, &model).await?;

    if !settlement::can_cancel(model.status) {
        return Err(AppError::conflict(
            "booking_not_active",
            format!("A {} booking cannot be cancelled", model.status),
        ));
    }

    let old_status = model.status;
    let property_id = model.property_id;
    let buyer_id = model.buyer_id;

    let mut active: booking::ActiveModel = model.into();
    active.status = Set(BookingStatus::Cancelled);
    active.cancellation_reason = Set(Some(payload.reason.trim().to_string()));
    active.cancellation_initiated_by = Set(Some(auth_user.role.as_str().to_string()));
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    // Release the unit only if no other active booking holds it.
    if !other_active_booking_exists(&txn, property_id, id).await? {
        let prop = property::Entity::find_by_id(property_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::Internal("Booking without property".into()))?;
        catalog::set_property_status(&txn, prop, PropertyStatus::Available, None).await?;
    }

    txn.commit().await?;

    state.events.publish(DomainEvent::BookingStateChanged {
        booking_id: id,
        buyer_id,
        old: old_status,
        new: BookingStatus::Cancelled,
    });

    // Auto-refund every completed payment's un-refunded remainder. Gateway
    // hiccups here must not undo the cancellation; they are logged and the
    // refund row is left for operator retry.
    let completed_payments = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(Some(id)))
        .filter(payment::Column::Status.eq(PaymentStatus::Completed))
        .all(&state.db)
        .await?;

    for pay in completed_payments {
        if pay.refund_amount >= pay.amount {
            continue;
        }
        if let Err(e) = initiate_refund_for(
            &state,
            pay.id,
            None,
            Some("booking cancelled".to_string()),
        )
        .await
        {
            warn!(payment_id = pay.id, error = ?e, "Auto-refund initiation failed");
        }
    }

    Ok(Json(BookingResponse::from(updated)))
}
