//! HTTP request handlers for the FlexSpace API
//!
//! Auth handlers live in `crate::auth::handlers`; everything else is here.

pub mod bookings;
pub mod health;
pub mod rooms;
pub mod types;
pub mod users;

pub use bookings::*;
pub use health::*;
pub use rooms::*;
pub use users::*;

// Re-export all types for convenience
pub use types::*;
