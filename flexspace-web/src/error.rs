//! HTTP error mapping
//!
//! Every failure leaves the server as `{ "error": <code>, "message": <text> }`.

use crate::auth::jwt::AuthError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flexspace_core::FlexSpaceError;
use serde_json::json;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] FlexSpaceError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(e) => {
                StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::Auth(e) => e.status(),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Auth(e) => e.into_response(),
            ApiError::Domain(e) => {
                e.log();
                // Internal details stay in the log.
                let message = if e.is_client_error() {
                    e.to_string()
                } else {
                    "Internal server error".to_string()
                };
                (status, Json(json!({ "error": e.code(), "message": message }))).into_response()
            }
            ApiError::BadRequest(message) => {
                debug!("Rejected request: {}", message);
                (
                    status,
                    Json(json!({ "error": "bad_request", "message": message })),
                )
                    .into_response()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
