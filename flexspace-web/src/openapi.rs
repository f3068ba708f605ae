//! OpenAPI document for the FlexSpace API, served at `/api/openapi.json`

use axum::response::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::auth::{
    jwt::TokenPair,
    sessions::{AuthResponse, SessionUser},
};
use crate::handlers::{
    BookingPageResponse, ChangePasswordRequest, CreateBookingRequest, CreateUserRequest,
    ErrorResponse, ForgotPasswordRequest, HealthResponse, LoginRequest, MessageResponse,
    RefreshRequest, RegisterRequest, ResetPasswordRequest, UpdateBookingStatusRequest,
    UserPageResponse,
};
use flexspace_core::{
    Booking, BookingStatus, NewRoom, Room, RoomPatch, RoomType, UserPatch, UserProfile, UserRole,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FlexSpace API",
        version = "0.1.0",
        description = "Coworking room catalog, bookings and accounts",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        crate::handlers::health_check,

        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh,
        crate::auth::handlers::logout,
        crate::auth::handlers::profile,
        crate::auth::handlers::forgot_password,
        crate::auth::handlers::reset_password,

        crate::handlers::list_rooms,
        crate::handlers::get_room,
        crate::handlers::get_room_by_slug,
        crate::handlers::create_room,
        crate::handlers::update_room,
        crate::handlers::delete_room,
        crate::handlers::upload_room_photos,

        crate::handlers::create_booking,
        crate::handlers::my_bookings,
        crate::handlers::list_bookings,
        crate::handlers::get_booking,
        crate::handlers::cancel_booking,
        crate::handlers::update_booking_status,

        crate::handlers::list_users,
        crate::handlers::create_user,
        crate::handlers::get_me,
        crate::handlers::update_me,
        crate::handlers::change_password,
        crate::handlers::get_user,
        crate::handlers::update_user,
        crate::handlers::delete_user,
    ),
    components(
        schemas(
            HealthResponse,
            MessageResponse,
            ErrorResponse,
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            AuthResponse,
            SessionUser,
            TokenPair,
            Room,
            RoomType,
            NewRoom,
            RoomPatch,
            Booking,
            BookingStatus,
            CreateBookingRequest,
            UpdateBookingStatusRequest,
            BookingPageResponse,
            UserRole,
            UserProfile,
            UserPatch,
            CreateUserRequest,
            ChangePasswordRequest,
            UserPageResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Registration, login and token lifecycle"),
        (name = "Rooms", description = "Room catalog and photos"),
        (name = "Bookings", description = "Room reservations"),
        (name = "Users", description = "Profiles and user administration"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
