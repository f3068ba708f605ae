//! Shared application state

use crate::auth::{
    email::{notifier_from_config, EmailNotifier, EmailTemplates},
    jwt::TokenIssuer,
    sessions::SessionService,
};
use crate::uploads::PhotoStore;
use crate::{WebError, WebResult};
use flexspace_applications::{BookingService, RoomService, StorageBackend, UserService};
use flexspace_core::FlexSpaceConfig;
use std::sync::Arc;
use tracing::info;

/// Services shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<FlexSpaceConfig>,
    pub tokens: TokenIssuer,
    pub sessions: SessionService,
    pub users: UserService,
    pub rooms: RoomService,
    pub bookings: BookingService,
    pub photos: PhotoStore,
}

impl AppState {
    /// Build state from configuration: open storage, pick a mail transport,
    /// and seed the bootstrap admin if one is configured.
    pub async fn new(config: FlexSpaceConfig) -> WebResult<Self> {
        config.validate()?;

        let storage = StorageBackend::from_url(config.database.url.as_deref()).await?;
        let notifier = notifier_from_config(&config.smtp)
            .map_err(|e| WebError::Config(format!("Failed to configure SMTP: {}", e)))?;

        let state = Self::with_parts(config, storage, notifier);
        state.ensure_bootstrap_admin().await?;
        Ok(state)
    }

    /// Assemble state from already-built parts
    pub fn with_parts(
        config: FlexSpaceConfig,
        storage: StorageBackend,
        notifier: Arc<dyn EmailNotifier>,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.auth);
        let sessions = SessionService::new(
            storage.users.clone(),
            tokens.clone(),
            notifier,
            EmailTemplates::new(&config.smtp),
        );

        Self {
            tokens,
            sessions,
            users: UserService::new(storage.users.clone()),
            rooms: RoomService::new(storage.rooms.clone()),
            bookings: BookingService::new(storage.bookings.clone(), storage.rooms.clone()),
            photos: PhotoStore::new(&config.server.upload_dir),
            config: Arc::new(config),
        }
    }

    async fn ensure_bootstrap_admin(&self) -> WebResult<()> {
        let auth = &self.config.auth;
        if let (Some(email), Some(password)) = (&auth.admin_email, &auth.admin_password) {
            let name = auth.admin_name.as_deref().unwrap_or("Administrator");
            if self.users.ensure_admin(name, email, password).await? {
                info!("Created bootstrap admin {}", email);
            }
        }
        Ok(())
    }
}
