//! Session lifecycle: registration, login, token rotation, logout and password reset
//!
//! A user's `token_version` is the revocation switch. Every issued token embeds it, and
//! bumping it invalidates all outstanding access and refresh tokens at once.

use super::email::{dispatch, EmailNotifier, EmailTemplates};
use super::jwt::{AuthError, TokenIssuer, TokenPair};
use crate::error::ApiError;
use flexspace_applications::{hash_password, verify_password, UserService, UserStorage};
use flexspace_core::validation::validate_password;
use flexspace_core::{User, UserId, UserProfile, UserRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Returned by forgot-password whether or not the email is known
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent";

/// Minimal user view embedded in auth responses
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: SessionUser,
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthResponse {
    fn new(user: &User, tokens: TokenPair) -> Self {
        Self {
            user: SessionUser::from(user),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

#[derive(Clone)]
pub struct SessionService {
    users: UserService,
    storage: Arc<dyn UserStorage>,
    tokens: TokenIssuer,
    notifier: Arc<dyn EmailNotifier>,
    templates: EmailTemplates,
}

impl SessionService {
    pub fn new(
        storage: Arc<dyn UserStorage>,
        tokens: TokenIssuer,
        notifier: Arc<dyn EmailNotifier>,
        templates: EmailTemplates,
    ) -> Self {
        Self {
            users: UserService::new(storage.clone()),
            storage,
            tokens,
            notifier,
            templates,
        }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let user = self
            .users
            .create_user(name, email, password, UserRole::User)
            .await?;
        let tokens = self.tokens.issue_pair(&user)?;
        info!("User {} registered", user.id);
        Ok(AuthResponse::new(&user, tokens))
    }

    /// Unknown email and wrong password fail identically
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let Some(user) = self.storage.find_user_by_email(email).await? else {
            warn!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials.into());
        };
        if !verify_password(password, &user.password_hash) {
            warn!("Login attempt with wrong password for user {}", user.id);
            return Err(AuthError::InvalidCredentials.into());
        }

        let tokens = self.tokens.issue_pair(&user)?;
        info!("User {} logged in", user.id);
        Ok(AuthResponse::new(&user, tokens))
    }

    /// Single-use rotation: the presented version must be current, and is consumed.
    pub async fn refresh(
        &self,
        user_id: UserId,
        presented_version: i64,
    ) -> Result<TokenPair, ApiError> {
        let user = self.load_for_token(user_id).await?;
        let new_version = self
            .storage
            .rotate_token_version(user_id, presented_version)
            .await?
            .ok_or_else(|| {
                warn!("Stale refresh token presented for user {}", user_id);
                AuthError::TokenRevoked
            })?;

        let tokens = self.tokens.issue_pair_for(user.id, user.role, new_version)?;
        info!("Rotated tokens for user {} to version {}", user_id, new_version);
        Ok(tokens)
    }

    /// Verify a refresh token and rotate it
    pub async fn refresh_with_token(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let claims = self.tokens.verify_refresh(refresh_token)?;
        self.refresh(claims.user_id, claims.token_version).await
    }

    /// Revoke every outstanding token of the user
    pub async fn logout(&self, user_id: UserId) -> Result<(), ApiError> {
        let version = self.storage.increment_token_version(user_id).await?;
        info!("User {} logged out, token version now {}", user_id, version);
        Ok(())
    }

    pub async fn forgot_password(&self, email: &str) -> Result<&'static str, ApiError> {
        match self.storage.find_user_by_email(email).await? {
            Some(user) => {
                let token = self.tokens.issue_reset(user.id)?;
                dispatch(
                    self.notifier.clone(),
                    self.templates.password_reset(&user.email, &user.name, &token),
                );
                info!("Password reset requested for user {}", user.id);
            }
            None => debug!("Password reset requested for unknown email"),
        }
        Ok(FORGOT_PASSWORD_MESSAGE)
    }

    /// Any token problem, including a vanished user, is a BadRequest.
    /// A successful reset also revokes all outstanding tokens.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        validate_password("newPassword", new_password)?;
        let claims = self.tokens.verify_reset(token)?;
        let user = self
            .storage
            .find_user(claims.user_id)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        self.storage
            .update_password(user.id, &hash_password(new_password)?, true)
            .await?;
        dispatch(
            self.notifier.clone(),
            self.templates.password_changed(&user.email, &user.name),
        );
        info!("Password reset completed for user {}", user.id);
        Ok(())
    }

    pub async fn profile(&self, user_id: UserId) -> Result<UserProfile, ApiError> {
        let user = self.users.get_user(user_id).await?;
        Ok(UserProfile::from(&user))
    }

    /// Load the user a verified token names; a deleted user is an invalid token.
    pub async fn load_for_token(&self, user_id: UserId) -> Result<User, ApiError> {
        match self.storage.find_user(user_id).await? {
            Some(user) => Ok(user),
            None => {
                debug!("Token names missing user {}", user_id);
                Err(AuthError::InvalidToken.into())
            }
        }
    }

    /// Resolve a bearer access token to its current user, enforcing the token version
    pub async fn authenticate(&self, access_token: &str) -> Result<User, ApiError> {
        let claims = self.tokens.verify_access(access_token)?;
        let user = self.load_for_token(claims.user_id).await?;
        if user.token_version != claims.token_version {
            warn!(
                "Revoked access token for user {} (version {} != {})",
                user.id, claims.token_version, user.token_version
            );
            return Err(AuthError::TokenRevoked.into());
        }
        Ok(user)
    }
}
