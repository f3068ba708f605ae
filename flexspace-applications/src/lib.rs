//! FlexSpace Applications - storage backends and domain services
//!
//! The web server and the CLI both drive FlexSpace through the services defined here.

pub mod bookings;
pub mod password;
pub mod rooms;
pub mod storage;
pub mod users;

pub use bookings::BookingService;
pub use password::{hash_password, verify_password};
pub use rooms::{RoomService, MAX_PHOTOS_PER_ROOM};
pub use storage::{BookingStorage, MemoryStorage, RoomStorage, StorageBackend, UserStorage};
pub use users::UserService;

#[cfg(feature = "sqlite")]
pub use storage::SqliteStorage;
