//! JWT issuance and verification
//!
//! Access and refresh tokens are signed with independent HS256 secrets. Password reset
//! tokens reuse the access secret but carry a different claim shape, so neither kind
//! verifies as the other.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use flexspace_core::{AuthConfig, User, UserId, UserRole};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Type tag carried by password reset tokens
pub const PASSWORD_RESET_TYPE: &str = "password-reset";

/// JWT signing and verification keys
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Session token claims, shared by access and refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: UserId,
    pub role: UserRole,
    pub token_version: i64,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    fn for_user(user_id: UserId, role: UserRole, token_version: i64, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            role,
            token_version,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

/// Password reset token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResetClaims {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

/// JWT token pair (access + refresh)
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Missing authorization header")]
    MissingAuthHeader,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token has been revoked")]
    TokenRevoked,
    #[error("Invalid or expired reset token")]
    InvalidResetToken,
    #[error("Admin access required")]
    AdminRequired,
    #[error("Token creation failed")]
    TokenCreation,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
            AuthError::AdminRequired => StatusCode::FORBIDDEN,
            AuthError::TokenCreation => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidToken => "invalid_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenRevoked => "token_revoked",
            AuthError::InvalidResetToken => "bad_request",
            AuthError::AdminRequired => "forbidden",
            AuthError::TokenCreation => "token_creation_failed",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

struct IssuerInner {
    access: Keys,
    refresh: Keys,
    access_ttl: Duration,
    refresh_ttl: Duration,
    reset_ttl: Duration,
    validation: Validation,
}

/// Mints and verifies every token kind. Cheap to clone.
#[derive(Clone)]
pub struct TokenIssuer {
    inner: Arc<IssuerInner>,
}

/// Token lifetimes are capped at ten years to keep `exp` arithmetic in range
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

fn secs(value: u64) -> Duration {
    Duration::seconds(value.min(MAX_TTL_SECS) as i64)
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            inner: Arc::new(IssuerInner {
                access: Keys::new(config.jwt_secret.as_bytes()),
                refresh: Keys::new(config.jwt_refresh_secret.as_bytes()),
                access_ttl: secs(config.access_ttl_secs),
                refresh_ttl: secs(config.refresh_ttl_secs),
                reset_ttl: secs(config.reset_ttl_secs),
                validation,
            }),
        }
    }

    fn sign<T: Serialize>(keys: &Keys, claims: &T) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &keys.encoding).map_err(|e| {
            warn!("Failed to encode JWT token: {}", e);
            AuthError::TokenCreation
        })
    }

    fn verify<T: DeserializeOwned>(&self, keys: &Keys, token: &str) -> Result<T, AuthError> {
        decode::<T>(token, &keys.decoding, &self.inner.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token verification failed: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })
    }

    /// Issue an access/refresh pair bound to the user's current token version
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        self.issue_pair_for(user.id, user.role, user.token_version)
    }

    pub fn issue_pair_for(
        &self,
        user_id: UserId,
        role: UserRole,
        token_version: i64,
    ) -> Result<TokenPair, AuthError> {
        let access = Claims::for_user(user_id, role, token_version, self.inner.access_ttl);
        let refresh = Claims::for_user(user_id, role, token_version, self.inner.refresh_ttl);

        Ok(TokenPair {
            access_token: Self::sign(&self.inner.access, &access)?,
            refresh_token: Self::sign(&self.inner.refresh, &refresh)?,
        })
    }

    /// Sign arbitrary access claims. Used for tokens with a custom lifetime.
    pub fn sign_access(&self, claims: &Claims) -> Result<String, AuthError> {
        Self::sign(&self.inner.access, claims)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(&self.inner.access, token)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(&self.inner.refresh, token)
    }

    pub fn issue_reset(&self, user_id: UserId) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = ResetClaims {
            user_id,
            token_type: PASSWORD_RESET_TYPE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.inner.reset_ttl).timestamp(),
        };
        Self::sign(&self.inner.access, &claims)
    }

    /// Every failure, including a wrong type tag, is reported as [`AuthError::InvalidResetToken`].
    pub fn verify_reset(&self, token: &str) -> Result<ResetClaims, AuthError> {
        let claims: ResetClaims = self
            .verify(&self.inner.access, token)
            .map_err(|_| AuthError::InvalidResetToken)?;
        if claims.token_type != PASSWORD_RESET_TYPE {
            return Err(AuthError::InvalidResetToken);
        }
        Ok(claims)
    }
}
