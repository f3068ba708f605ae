//! User administration and self-service handlers

use super::types::{
    ChangePasswordRequest, CreateUserRequest, ErrorResponse, MessageResponse, UserListParams,
    UserPageResponse,
};
use crate::auth::{AdminUser, CurrentUser};
use crate::error::ApiResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use flexspace_core::{validation::page_request, UserFilter, UserId, UserPatch, UserProfile, UserRole};
use tracing::info;

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(UserListParams),
    responses(
        (status = 200, description = "One page of users", body = UserPageResponse),
        (status = 400, description = "Invalid pagination", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    AppQuery(params): AppQuery<UserListParams>,
) -> ApiResult<Json<UserPageResponse>> {
    let page = page_request(params.page, params.limit)?;
    let filter = UserFilter {
        search: params.search,
        role: params.role,
    };
    let users = state.users.list_users(&filter, page).await?;
    Ok(Json(users.into()))
}

/// Create an account on someone's behalf. Role defaults to `user`.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserProfile),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppJson(request): AppJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let user = state
        .users
        .create_user(
            &request.name,
            &request.email,
            &request.password,
            request.role.unwrap_or(UserRole::User),
        )
        .await?;
    info!("Admin {} created user {}", admin.id, user.id);
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's profile", body = UserProfile),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}

/// Edit the caller's name or email. A `role` field is ignored.
#[utoipa::path(
    patch,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = UserPatch,
    responses(
        (status = 200, description = "Profile updated", body = UserProfile),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(patch): AppJson<UserPatch>,
) -> ApiResult<Json<UserProfile>> {
    let user = state.users.update_me(user.id, patch).await?;
    Ok(Json(UserProfile::from(&user)))
}

#[utoipa::path(
    patch,
    path = "/api/users/me/password",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "New password too short", body = ErrorResponse),
        (status = 401, description = "Current password is wrong", body = ErrorResponse)
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .users
        .change_password(user.id, &request.old_password, &request.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserProfile),
        (status = 404, description = "No such user", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    AppPath(id): AppPath<UserId>,
) -> ApiResult<Json<UserProfile>> {
    let user = state.users.get_user(id).await?;
    Ok(Json(UserProfile::from(&user)))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    request_body = UserPatch,
    responses(
        (status = 200, description = "User updated", body = UserProfile),
        (status = 404, description = "No such user", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    AppPath(id): AppPath<UserId>,
    AppJson(patch): AppJson<UserPatch>,
) -> ApiResult<Json<UserProfile>> {
    let user = state.users.update_user(id, patch).await?;
    Ok(Json(UserProfile::from(&user)))
}

/// Delete a user and their bookings
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "No such user", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<UserId>,
) -> ApiResult<StatusCode> {
    state.users.delete_user(id).await?;
    info!("Admin {} deleted user {}", admin.id, id);
    Ok(StatusCode::NO_CONTENT)
}
