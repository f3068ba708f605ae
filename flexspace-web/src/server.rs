//! FlexSpace Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebError, WebResult};
use axum::serve;
use flexspace_core::FlexSpaceConfig;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main FlexSpace web server
pub struct FlexSpaceServer {
    config: FlexSpaceConfig,
    state: AppState,
}

impl FlexSpaceServer {
    /// Create a new server, opening storage and seeding the bootstrap admin
    pub async fn new(config: FlexSpaceConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone()).await?;

        Ok(Self { config, state })
    }

    /// Serve until ctrl-c
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.server.address();

        info!("Starting FlexSpace web server");
        info!("Server address: http://{}", address);
        info!(
            "Storage: {}",
            if self.config.database.url.is_some() {
                "sqlite"
            } else {
                "in-memory"
            }
        );
        if !self.config.smtp.enabled {
            info!("SMTP disabled, outgoing emails are only logged");
        }

        tokio::fs::create_dir_all(self.state.photos.dir()).await?;

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &FlexSpaceConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for FlexSpaceServer
pub struct FlexSpaceServerBuilder {
    config: FlexSpaceConfig,
}

impl FlexSpaceServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: FlexSpaceConfig::default(),
        }
    }

    /// Start from a loaded configuration
    pub fn config(mut self, config: FlexSpaceConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Set database URL
    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.database.url = Some(database_url.into());
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<FlexSpaceServer> {
        FlexSpaceServer::new(self.config).await
    }
}

impl Default for FlexSpaceServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let builder = FlexSpaceServerBuilder::new()
            .host("0.0.0.0")
            .port(9000)
            .database_url("sqlite::memory:");

        assert_eq!(builder.config.server.address(), "0.0.0.0:9000");
        assert_eq!(
            builder.config.database.url.as_deref(),
            Some("sqlite::memory:")
        );
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_config() {
        let mut config = FlexSpaceConfig::default();
        config.auth.jwt_refresh_secret = config.auth.jwt_secret.clone();

        let result = FlexSpaceServerBuilder::new().config(config).build().await;
        assert!(matches!(result, Err(WebError::Domain(_))));
    }

    #[tokio::test]
    async fn test_build_seeds_admin() {
        let mut config = FlexSpaceConfig::default();
        config.auth.admin_email = Some("root@flexspace.com".to_string());
        config.auth.admin_password = Some("supersecret".to_string());

        let server = FlexSpaceServerBuilder::new()
            .config(config)
            .build()
            .await
            .unwrap();
        let admin = server
            .state()
            .users
            .find_by_email("root@flexspace.com")
            .await
            .unwrap()
            .unwrap();
        assert!(admin.role.is_admin());
    }
}
