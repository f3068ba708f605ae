//! Unified error handling system
//!
//! Structured error types with context, shared by every FlexSpace crate.
//! The HTTP layer maps each variant onto a status code via [`FlexSpaceError::http_status`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type FlexSpaceResult<T> = Result<T, FlexSpaceError>;

/// Error context providing additional information for debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }
}

/// Main error type for the FlexSpace system
#[derive(Error, Debug)]
pub enum FlexSpaceError {
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("{resource} not found")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("{message}")]
    Conflict {
        message: String,
        context: ErrorContext,
    },

    #[error("{message}")]
    Unauthorized {
        message: String,
        context: ErrorContext,
    },

    #[error("{message}")]
    Forbidden {
        message: String,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FlexSpaceError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.to_string()),
            context: ErrorContext::new("validation"),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            context: ErrorContext::new("lookup"),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            context: ErrorContext::new("uniqueness"),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            context: ErrorContext::new("auth"),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
            context: ErrorContext::new("auth"),
        }
    }

    pub fn storage<E>(component: &str, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
            context: ErrorContext::new(component),
        }
    }

    pub fn internal(component: &str, message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
            context: ErrorContext::new(component),
        }
    }

    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            FlexSpaceError::Validation { context, .. } => Some(context),
            FlexSpaceError::NotFound { context, .. } => Some(context),
            FlexSpaceError::Conflict { context, .. } => Some(context),
            FlexSpaceError::Unauthorized { context, .. } => Some(context),
            FlexSpaceError::Forbidden { context, .. } => Some(context),
            FlexSpaceError::Storage { context, .. } => Some(context),
            FlexSpaceError::Config { context, .. } => Some(context),
            FlexSpaceError::Internal { context, .. } => Some(context),
            FlexSpaceError::Io(_) | FlexSpaceError::Serialization(_) => None,
        }
    }

    /// Convert to HTTP status code
    pub fn http_status(&self) -> u16 {
        match self {
            FlexSpaceError::Validation { .. } => 400,
            FlexSpaceError::Unauthorized { .. } => 401,
            FlexSpaceError::Forbidden { .. } => 403,
            FlexSpaceError::NotFound { .. } => 404,
            FlexSpaceError::Conflict { .. } => 409,
            _ => 500,
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            FlexSpaceError::Validation { .. } => "bad_request",
            FlexSpaceError::NotFound { .. } => "not_found",
            FlexSpaceError::Conflict { .. } => "conflict",
            FlexSpaceError::Unauthorized { .. } => "unauthorized",
            FlexSpaceError::Forbidden { .. } => "forbidden",
            _ => "internal_error",
        }
    }

    /// Whether the error was caused by the caller rather than the server
    pub fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        if self.is_client_error() {
            warn!(error_id = ?error_id, error = %self, "Request rejected");
        } else {
            error!(error_id = ?error_id, error = %self, "Internal failure");
        }
    }
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::FlexSpaceError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new("config"),
        }
    };
    ($msg:expr, $source:expr) => {
        $crate::FlexSpaceError::Config {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new("config"),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(FlexSpaceError::validation("email", "bad").http_status(), 400);
        assert_eq!(FlexSpaceError::unauthorized("no").http_status(), 401);
        assert_eq!(FlexSpaceError::forbidden("no").http_status(), 403);
        assert_eq!(FlexSpaceError::not_found("Room 1").http_status(), 404);
        assert_eq!(FlexSpaceError::conflict("dup").http_status(), 409);
        assert_eq!(FlexSpaceError::internal("x", "boom").http_status(), 500);
    }

    #[test]
    fn test_messages_are_caller_facing() {
        let err = FlexSpaceError::not_found("Room 7");
        assert_eq!(err.to_string(), "Room 7 not found");
        assert!(err.is_client_error());

        let err = config_error!("JWT secret must not be empty");
        assert_eq!(
            err.to_string(),
            "Configuration error: JWT secret must not be empty"
        );
        assert!(!err.is_client_error());
        assert_eq!(err.context().map(|c| c.component.as_str()), Some("config"));
    }
}
