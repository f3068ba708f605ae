//! FlexSpace Core - domain types, errors, configuration and logging
//!
//! Shared by the storage/services layer, the web server and the operator CLI.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;
pub mod validation;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use chrono;
pub use tracing;
