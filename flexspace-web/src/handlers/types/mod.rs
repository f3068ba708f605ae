//! Request and response types for the REST API

pub mod auth;
pub mod bookings;
pub mod common;
pub mod rooms;
pub mod users;

pub use auth::*;
pub use bookings::*;
pub use common::*;
pub use rooms::*;
pub use users::*;
