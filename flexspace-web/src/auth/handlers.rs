//! Authentication handlers: registration, login, token rotation and password reset

use super::{jwt::TokenPair, sessions::AuthResponse, CurrentUser};
use crate::error::ApiResult;
use crate::extract::AppJson;
use crate::handlers::types::{
    ErrorResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RefreshRequest,
    RegisterRequest, ResetPasswordRequest,
};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use flexspace_core::validation::validate_email;
use flexspace_core::UserProfile;
use tracing::info;

/// Register a new account and sign it in
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    info!("Registration attempt");
    let response = state
        .sessions
        .register(&request.name, &request.email, &request.password)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Exchange email and password for a token pair
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    validate_email(&request.email)?;
    let response = state
        .sessions
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(response))
}

/// Rotate a refresh token. The presented token cannot be used again.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Invalid, expired or already used refresh token", body = ErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(request): AppJson<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let tokens = state
        .sessions
        .refresh_with_token(&request.refresh_token)
        .await?;
    Ok(Json(tokens))
}

/// Revoke every token of the caller
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Signed out", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    state.sessions.logout(user.id).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// The caller's profile
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.sessions.profile(user.id).await?))
}

/// Email a password reset link. The response never reveals whether the email exists.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Request accepted", body = MessageResponse)
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(request): AppJson<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    validate_email(&request.email)?;
    let message = state.sessions.forgot_password(&request.email).await?;
    Ok(Json(MessageResponse::new(message)))
}

/// Set a new password using a reset token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "Auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 400, description = "Invalid or expired reset token", body = ErrorResponse)
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(request): AppJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .sessions
        .reset_password(&request.token, &request.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password has been reset successfully")))
}
