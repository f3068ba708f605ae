//! Configuration management
//!
//! Layering order: defaults, then an optional TOML file, then environment variables.
//! Command-line overrides are applied by the binaries on top of the result.

use crate::config_error;
use crate::error::{ErrorContext, FlexSpaceError, FlexSpaceResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FlexSpaceConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub smtp: SmtpConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
    /// Directory that room photos are written to and served from
    pub upload_dir: PathBuf,
    /// Request body ceiling in bytes
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
            upload_dir: PathBuf::from("uploads"),
            max_body_bytes: 60 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite URL such as `sqlite://flexspace.db`. Absent means in-memory storage.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    /// Access token lifetime in seconds
    pub access_ttl_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_ttl_secs: u64,
    /// Password reset token lifetime in seconds
    pub reset_ttl_secs: u64,
    /// Seed admin created at startup when no user has this email
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_name: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-access-secret".to_string(),
            jwt_refresh_secret: "change-me-refresh-secret".to_string(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 60 * 60,
            reset_ttl_secs: 60 * 60,
            admin_email: None,
            admin_password: None,
            admin_name: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// When false, emails are written to the log instead of sent
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: String,
    pub app_name: String,
    pub frontend_url: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 587,
            user: None,
            pass: None,
            from: "support@flexspace.com".to_string(),
            app_name: "FlexSpace".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

impl FlexSpaceConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> FlexSpaceResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FlexSpaceError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("read_file"),
        })?;

        toml::from_str(&content).map_err(|e| FlexSpaceError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("parse_toml"),
        })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> FlexSpaceResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| FlexSpaceError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| FlexSpaceError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("write_file"),
        })
    }

    /// Defaults, overlaid with the file at `path` when given, overlaid with the process environment
    pub fn load(path: Option<&Path>) -> FlexSpaceResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay values found through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> FlexSpaceResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FLEXSPACE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("FLEXSPACE_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| config_error!(format!("Invalid FLEXSPACE_PORT '{}'", port), e))?;
        }
        if let Some(dir) = lookup("UPLOAD_DIR") {
            self.server.upload_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = Some(url);
        }

        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(secret) = lookup("JWT_REFRESH_SECRET") {
            self.auth.jwt_refresh_secret = secret;
        }
        if let Some(ttl) = lookup("JWT_EXPIRES_IN") {
            self.auth.access_ttl_secs = parse_duration_secs(&ttl)?;
        }
        if let Some(ttl) = lookup("JWT_REFRESH_EXPIRES_IN") {
            self.auth.refresh_ttl_secs = parse_duration_secs(&ttl)?;
        }
        if let Some(email) = lookup("ADMIN_EMAIL") {
            self.auth.admin_email = Some(email);
        }
        if let Some(password) = lookup("ADMIN_PASSWORD") {
            self.auth.admin_password = Some(password);
        }

        if let Some(host) = lookup("SMTP_HOST") {
            self.smtp.host = host;
            self.smtp.enabled = true;
        }
        if let Some(port) = lookup("SMTP_PORT") {
            self.smtp.port = port
                .parse()
                .map_err(|e| config_error!(format!("Invalid SMTP_PORT '{}'", port), e))?;
        }
        if let Some(user) = lookup("SMTP_USER") {
            self.smtp.user = Some(user);
        }
        if let Some(pass) = lookup("SMTP_PASS") {
            self.smtp.pass = Some(pass);
        }
        if let Some(from) = lookup("SMTP_FROM") {
            self.smtp.from = from;
        }
        if let Some(name) = lookup("APP_NAME") {
            self.smtp.app_name = name;
        }
        if let Some(url) = lookup("FRONTEND_URL") {
            self.smtp.frontend_url = url;
        }

        if let Some(level) = lookup("FLEXSPACE_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> FlexSpaceResult<()> {
        if self.auth.jwt_secret.is_empty() || self.auth.jwt_refresh_secret.is_empty() {
            return Err(config_error!("JWT secrets must not be empty"));
        }
        if self.auth.jwt_secret == self.auth.jwt_refresh_secret {
            return Err(config_error!(
                "Access and refresh tokens must be signed with different secrets"
            ));
        }
        if self.auth.access_ttl_secs == 0
            || self.auth.refresh_ttl_secs == 0
            || self.auth.reset_ttl_secs == 0
        {
            return Err(config_error!("Token lifetimes must be greater than 0"));
        }
        if self.auth.admin_email.is_some() != self.auth.admin_password.is_some() {
            return Err(config_error!(
                "admin_email and admin_password must be set together"
            ));
        }
        if self.smtp.enabled && self.smtp.host.is_empty() {
            return Err(config_error!("SMTP host must be set when SMTP is enabled"));
        }
        Ok(())
    }
}

/// Parse `"15m"`, `"7d"`, `"12h"`, `"30s"` or a bare number of seconds.
pub fn parse_duration_secs(value: &str) -> FlexSpaceResult<u64> {
    let value = value.trim();
    let invalid = || config_error!(format!("Invalid duration '{}'", value));

    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits.parse().map_err(|_| invalid())?;

    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return Err(invalid()),
    };
    amount.checked_mul(multiplier).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_duration_units() {
        assert_eq!(parse_duration_secs("15m").unwrap(), 900);
        assert_eq!(parse_duration_secs("7d").unwrap(), 604_800);
        assert_eq!(parse_duration_secs("2h").unwrap(), 7200);
        assert_eq!(parse_duration_secs("45").unwrap(), 45);
        assert!(parse_duration_secs("m").is_err());
        assert!(parse_duration_secs("10w").is_err());
    }

    #[test]
    fn test_env_overlay() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("JWT_SECRET", "a"),
            ("JWT_REFRESH_SECRET", "b"),
            ("JWT_EXPIRES_IN", "5m"),
            ("SMTP_HOST", "smtp.example.com"),
            ("FLEXSPACE_PORT", "8081"),
        ]);
        let mut config = FlexSpaceConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.auth.jwt_secret, "a");
        assert_eq!(config.auth.access_ttl_secs, 300);
        assert_eq!(config.auth.refresh_ttl_secs, 7 * 24 * 3600);
        assert!(config.smtp.enabled);
        assert_eq!(config.server.port, 8081);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_shared_secret() {
        let mut config = FlexSpaceConfig::default();
        config.auth.jwt_refresh_secret = config.auth.jwt_secret.clone();
        assert!(config.validate().is_err());

        let mut config = FlexSpaceConfig::default();
        config.auth.access_ttl_secs = 0;
        assert!(config.validate().is_err());
    }
}
