//! Route definitions for the FlexSpace API

use crate::{auth::handlers as auth, handlers, openapi, AppState};
use axum::{
    routing::{get, patch, post},
    Router,
};

/// Create API routes, mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(openapi::openapi_json))
        // Sessions
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/profile", get(auth::profile))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        // Room catalog
        .route(
            "/rooms",
            get(handlers::list_rooms).post(handlers::create_room),
        )
        .route("/rooms/slug/{slug}", get(handlers::get_room_by_slug))
        .route(
            "/rooms/{id}",
            get(handlers::get_room)
                .patch(handlers::update_room)
                .delete(handlers::delete_room),
        )
        .route("/rooms/{id}/photos", post(handlers::upload_room_photos))
        // Bookings
        .route(
            "/bookings",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route("/bookings/my", get(handlers::my_bookings))
        .route("/bookings/{id}", get(handlers::get_booking))
        .route("/bookings/{id}/cancel", patch(handlers::cancel_booking))
        .route("/bookings/{id}/status", patch(handlers::update_booking_status))
        // Users
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/users/me", get(handlers::get_me).patch(handlers::update_me))
        .route("/users/me/password", patch(handlers::change_password))
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
}
