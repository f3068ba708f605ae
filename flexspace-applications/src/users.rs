//! User administration and self-service account operations

use crate::password::{hash_password, verify_password};
use crate::storage::UserStorage;
use flexspace_core::validation::{
    validate_email, validate_name, validate_password, validate_registration,
};
use flexspace_core::{
    FlexSpaceError, FlexSpaceResult, NewUser, Page, PageRequest, User, UserFilter, UserId,
    UserPatch, UserProfile, UserRole,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct UserService {
    storage: Arc<dyn UserStorage>,
}

impl UserService {
    pub fn new(storage: Arc<dyn UserStorage>) -> Self {
        Self { storage }
    }

    /// Validate, hash and store a new account. Conflict when the email exists.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> FlexSpaceResult<User> {
        validate_registration(name, email, password)?;

        if self.storage.find_user_by_email(email).await?.is_some() {
            warn!("Rejected duplicate registration for {}", email);
            return Err(FlexSpaceError::conflict("email already registered"));
        }

        let user = self
            .storage
            .create_user(NewUser {
                name: name.trim().to_string(),
                email: email.to_string(),
                password_hash: hash_password(password)?,
                role,
            })
            .await?;

        info!("Created user {} with role {}", user.id, user.role);
        Ok(user)
    }

    pub async fn get_user(&self, id: UserId) -> FlexSpaceResult<User> {
        debug!("Loading user {}", id);
        self.storage
            .find_user(id)
            .await?
            .ok_or_else(|| FlexSpaceError::not_found(format!("User {}", id)))
    }

    pub async fn find_by_email(&self, email: &str) -> FlexSpaceResult<Option<User>> {
        self.storage.find_user_by_email(email).await
    }

    pub async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> FlexSpaceResult<Page<UserProfile>> {
        let (users, total) = self.storage.list_users(filter, page).await?;
        Ok(Page::new(users.iter().map(UserProfile::from).collect(), total, page))
    }

    /// Admin edit of name, email and role
    pub async fn update_user(&self, id: UserId, patch: UserPatch) -> FlexSpaceResult<User> {
        let mut user = self.get_user(id).await?;
        if let Some(name) = patch.name {
            validate_name(&name)?;
            user.name = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            validate_email(&email)?;
            user.email = email;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }

        let user = self.storage.update_user(&user).await?;
        info!("Updated user {}", user.id);
        Ok(user)
    }

    /// Self-service edit; a role in the patch is ignored
    pub async fn update_me(&self, id: UserId, patch: UserPatch) -> FlexSpaceResult<User> {
        self.update_user(
            id,
            UserPatch {
                role: None,
                ..patch
            },
        )
        .await
    }

    pub async fn delete_user(&self, id: UserId) -> FlexSpaceResult<()> {
        self.storage.delete_user(id).await?;
        info!("Deleted user {}", id);
        Ok(())
    }

    /// Outstanding tokens stay valid after a password change.
    pub async fn change_password(
        &self,
        id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> FlexSpaceResult<()> {
        validate_password("newPassword", new_password)?;
        let user = self.get_user(id).await?;
        if !verify_password(old_password, &user.password_hash) {
            warn!("Wrong current password for user {}", id);
            return Err(FlexSpaceError::unauthorized("current password is incorrect"));
        }

        self.storage
            .update_password(id, &hash_password(new_password)?, false)
            .await?;
        info!("Password changed for user {}", id);
        Ok(())
    }

    /// Create the bootstrap admin unless the email is already registered.
    /// Returns whether an account was created.
    pub async fn ensure_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> FlexSpaceResult<bool> {
        if self.storage.find_user_by_email(email).await?.is_some() {
            debug!("Admin {} already exists", email);
            return Ok(false);
        }
        self.create_user(name, email, password, UserRole::Admin)
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_create_and_duplicate() {
        let users = service();
        let ann = users
            .create_user("Ann", "ann@x.com", "password1", UserRole::User)
            .await
            .unwrap();
        assert_ne!(ann.password_hash, "password1");

        let err = users
            .create_user("Ann", "ann@x.com", "password1", UserRole::User)
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 409);

        let err = users
            .create_user("A", "a@x.com", "password1", UserRole::User)
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn test_update_me_ignores_role() {
        let users = service();
        let ann = users
            .create_user("Ann", "ann@x.com", "password1", UserRole::User)
            .await
            .unwrap();
        let updated = users
            .update_me(
                ann.id,
                UserPatch {
                    name: Some("Annie".to_string()),
                    email: None,
                    role: Some(UserRole::Admin),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Annie");
        assert_eq!(updated.role, UserRole::User);

        let promoted = users
            .update_user(
                ann.id,
                UserPatch {
                    role: Some(UserRole::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(promoted.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_change_password_keeps_token_version() {
        let users = service();
        let ann = users
            .create_user("Ann", "ann@x.com", "password1", UserRole::User)
            .await
            .unwrap();

        let err = users
            .change_password(ann.id, "wrong-password", "password2")
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 401);

        users
            .change_password(ann.id, "password1", "password2")
            .await
            .unwrap();
        let reloaded = users.get_user(ann.id).await.unwrap();
        assert!(verify_password("password2", &reloaded.password_hash));
        assert_eq!(reloaded.token_version, 0);
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let users = service();
        assert!(users
            .ensure_admin("Root", "root@x.com", "rootpassword")
            .await
            .unwrap());
        assert!(!users
            .ensure_admin("Root", "root@x.com", "rootpassword")
            .await
            .unwrap());
        let admin = users.find_by_email("root@x.com").await.unwrap().unwrap();
        assert!(admin.role.is_admin());
    }
}
