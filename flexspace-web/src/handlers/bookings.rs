//! Booking handlers

use super::types::{
    BookingListParams, BookingPageResponse, CreateBookingRequest, ErrorResponse,
    UpdateBookingStatusRequest,
};
use crate::auth::{AdminUser, CurrentUser};
use crate::error::ApiResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use flexspace_core::{validation::page_request, Booking, BookingFilter, BookingId};

/// Book a room for an interval. Overlapping an active booking is a conflict.
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created as pending", body = Booking),
        (status = 400, description = "dateEnd not after dateStart", body = ErrorResponse),
        (status = 404, description = "No such room", body = ErrorResponse),
        (status = 409, description = "Room already booked for this time", body = ErrorResponse)
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let booking = state
        .bookings
        .create(user.id, request.room_id, request.date_start, request.date_end)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// The caller's bookings, newest first
#[utoipa::path(
    get,
    path = "/api/bookings/my",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's bookings", body = Vec<Booking>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn my_bookings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Booking>>> {
    Ok(Json(state.bookings.my(user.id).await?))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(BookingListParams),
    responses(
        (status = 200, description = "One page of bookings", body = BookingPageResponse),
        (status = 400, description = "Invalid pagination", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse)
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    AppQuery(params): AppQuery<BookingListParams>,
) -> ApiResult<Json<BookingPageResponse>> {
    let page = page_request(params.page, params.limit)?;
    let filter = BookingFilter {
        status: params.status,
        date_start: params.date_start,
        date_end: params.date_end,
    };
    let bookings = state.bookings.list(&filter, page).await?;
    Ok(Json(bookings.into()))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking", body = Booking),
        (status = 403, description = "Neither owner nor admin", body = ErrorResponse),
        (status = 404, description = "No such booking", body = ErrorResponse)
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<BookingId>,
) -> ApiResult<Json<Booking>> {
    Ok(Json(state.bookings.get(id, user.id, user.role).await?))
}

/// Owner cancellation of a pending or paid booking
#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/cancel",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled", body = Booking),
        (status = 400, description = "Booking already cancelled or done", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "No such booking", body = ErrorResponse)
    )
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<BookingId>,
) -> ApiResult<Json<Booking>> {
    Ok(Json(state.bookings.cancel(id, user.id).await?))
}

/// Admin status write, any status to any status
#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/status",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Booking id")),
    request_body = UpdateBookingStatusRequest,
    responses(
        (status = 200, description = "Booking updated", body = Booking),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "No such booking", body = ErrorResponse)
    )
)]
pub async fn update_booking_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    AppPath(id): AppPath<BookingId>,
    AppJson(request): AppJson<UpdateBookingStatusRequest>,
) -> ApiResult<Json<Booking>> {
    Ok(Json(
        state.bookings.update_status(id, request.status).await?,
    ))
}
