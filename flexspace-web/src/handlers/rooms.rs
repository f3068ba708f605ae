//! Room catalog handlers

use super::types::{ErrorResponse, RoomListParams};
use crate::auth::AdminUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::uploads::PendingPhoto;
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use flexspace_core::{NewRoom, Room, RoomFilter, RoomId, RoomPatch};
use tracing::{debug, info};

/// List rooms, optionally filtered
#[utoipa::path(
    get,
    path = "/api/rooms",
    tag = "Rooms",
    params(RoomListParams),
    responses(
        (status = 200, description = "Matching rooms", body = Vec<Room>),
        (status = 400, description = "Malformed filter", body = ErrorResponse)
    )
)]
pub async fn list_rooms(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<RoomListParams>,
) -> ApiResult<Json<Vec<Room>>> {
    let filter = RoomFilter::from(params);
    let rooms = state.rooms.list(&filter).await?;
    debug!("Listing {} rooms", rooms.len());
    Ok(Json(rooms))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{id}",
    tag = "Rooms",
    params(("id" = i64, Path, description = "Room id")),
    responses(
        (status = 200, description = "Room", body = Room),
        (status = 404, description = "No such room", body = ErrorResponse)
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    AppPath(id): AppPath<RoomId>,
) -> ApiResult<Json<Room>> {
    Ok(Json(state.rooms.get(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/rooms/slug/{slug}",
    tag = "Rooms",
    params(("slug" = String, Path, description = "Room slug")),
    responses(
        (status = 200, description = "Room", body = Room),
        (status = 404, description = "No such room", body = ErrorResponse)
    )
)]
pub async fn get_room_by_slug(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> ApiResult<Json<Room>> {
    Ok(Json(state.rooms.get_by_slug(&slug).await?))
}

#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    request_body = NewRoom,
    responses(
        (status = 201, description = "Room created", body = Room),
        (status = 400, description = "Invalid room", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 409, description = "Slug already in use", body = ErrorResponse)
    )
)]
pub async fn create_room(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppJson(request): AppJson<NewRoom>,
) -> ApiResult<(StatusCode, Json<Room>)> {
    let room = state.rooms.create(request).await?;
    info!("Admin {} created room {}", admin.id, room.slug);
    Ok((StatusCode::CREATED, Json(room)))
}

#[utoipa::path(
    patch,
    path = "/api/rooms/{id}",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Room id")),
    request_body = RoomPatch,
    responses(
        (status = 200, description = "Room updated", body = Room),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 404, description = "No such room", body = ErrorResponse)
    )
)]
pub async fn update_room(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    AppPath(id): AppPath<RoomId>,
    AppJson(patch): AppJson<RoomPatch>,
) -> ApiResult<Json<Room>> {
    Ok(Json(state.rooms.update(id, patch).await?))
}

/// Delete a room together with its bookings and photo files
#[utoipa::path(
    delete,
    path = "/api/rooms/{id}",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Room id")),
    responses(
        (status = 204, description = "Room deleted"),
        (status = 404, description = "No such room", body = ErrorResponse)
    )
)]
pub async fn delete_room(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    AppPath(id): AppPath<RoomId>,
) -> ApiResult<StatusCode> {
    let room = state.rooms.get(id).await?;
    state.rooms.delete(id).await?;
    state.photos.remove_all(&room.photos).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Attach photos from a multipart form. Every part must be an image under 5 MB.
///
/// Files are checked before anything is written, and written files are removed
/// again if the room refuses them.
#[utoipa::path(
    post,
    path = "/api/rooms/{id}/photos",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Room id")),
    request_body(content_type = "multipart/form-data", description = "One or more `photos` file parts"),
    responses(
        (status = 200, description = "Room with the new photos", body = Room),
        (status = 400, description = "Not an image, too large, or too many photos", body = ErrorResponse),
        (status = 404, description = "No such room", body = ErrorResponse)
    )
)]
pub async fn upload_room_photos(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    AppPath(id): AppPath<RoomId>,
    mut multipart: Multipart,
) -> ApiResult<Json<Room>> {
    let slots = state.rooms.photo_slots(id).await?;

    let mut pending = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.file_name().is_none() {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        pending.push(PendingPhoto::new(content_type.as_deref(), bytes.to_vec())?);
    }

    if pending.is_empty() {
        return Err(ApiError::bad_request("no photos uploaded"));
    }
    if pending.len() > slots {
        return Err(ApiError::bad_request(format!(
            "room {} has room for {} more photos, got {}",
            id,
            slots,
            pending.len()
        )));
    }

    let urls = state.photos.save_all(pending).await?;
    match state.rooms.add_photos(id, urls.clone()).await {
        Ok(room) => Ok(Json(room)),
        Err(e) => {
            state.photos.remove_all(&urls).await;
            Err(e.into())
        }
    }
}
