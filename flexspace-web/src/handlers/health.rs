//! Liveness probe

use super::types::HealthResponse;
use crate::AppState;
use axum::{extract::State, response::Json};

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    summary = "Liveness probe",
    description = "Reports the build version and which storage backend is active",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = if state.config.database.url.is_some() {
        "sqlite"
    } else {
        "memory"
    };
    Json(HealthResponse {
        status: "healthy".to_string(),
        storage: storage.to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
