//! Storage backends
//!
//! Three narrow traits cover users, rooms and bookings. Both backends implement all of them
//! over a single shared store so cascading deletes stay consistent.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;
use flexspace_core::{
    Booking, BookingFilter, BookingId, BookingStatus, FlexSpaceResult, NewBooking, NewRoom,
    NewUser, PageRequest, Room, RoomFilter, RoomId, User, UserFilter, UserId,
};
use std::sync::Arc;

pub use memory::MemoryStorage;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;

/// Credential store
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Insert a user. Conflict when the email is already registered.
    async fn create_user(&self, user: NewUser) -> FlexSpaceResult<User>;

    async fn find_user(&self, id: UserId) -> FlexSpaceResult<Option<User>>;

    /// Case-insensitive email lookup
    async fn find_user_by_email(&self, email: &str) -> FlexSpaceResult<Option<User>>;

    /// Matching users ordered by id, plus the unpaginated match count
    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> FlexSpaceResult<(Vec<User>, u64)>;

    /// Persist name, email and role. Conflict when the new email belongs to another user.
    async fn update_user(&self, user: &User) -> FlexSpaceResult<User>;

    /// Replace the password hash, optionally revoking every outstanding token.
    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
        revoke_tokens: bool,
    ) -> FlexSpaceResult<()>;

    /// Atomically bump the token version and return the new value.
    async fn increment_token_version(&self, id: UserId) -> FlexSpaceResult<i64>;

    /// Bump the token version only if it still equals `expected`.
    /// Returns the new version, or `None` when the stored version differs.
    async fn rotate_token_version(
        &self,
        id: UserId,
        expected: i64,
    ) -> FlexSpaceResult<Option<i64>>;

    /// Delete a user and their bookings
    async fn delete_user(&self, id: UserId) -> FlexSpaceResult<()>;
}

/// Room catalog store
#[async_trait]
pub trait RoomStorage: Send + Sync {
    /// Conflict when the slug is taken
    async fn create_room(&self, room: NewRoom) -> FlexSpaceResult<Room>;

    async fn find_room(&self, id: RoomId) -> FlexSpaceResult<Option<Room>>;

    async fn find_room_by_slug(&self, slug: &str) -> FlexSpaceResult<Option<Room>>;

    async fn list_rooms(&self, filter: &RoomFilter) -> FlexSpaceResult<Vec<Room>>;

    /// Persist every mutable field. Conflict when the slug belongs to another room.
    async fn update_room(&self, room: &Room) -> FlexSpaceResult<Room>;

    /// Delete a room and its bookings
    async fn delete_room(&self, id: RoomId) -> FlexSpaceResult<()>;
}

/// Booking store
#[async_trait]
pub trait BookingStorage: Send + Sync {
    /// Insert a pending booking unless a non-cancelled booking of the same room overlaps it.
    /// The overlap check and the insert are atomic.
    async fn create_booking(&self, booking: NewBooking) -> FlexSpaceResult<Booking>;

    async fn find_booking(&self, id: BookingId) -> FlexSpaceResult<Option<Booking>>;

    /// A user's bookings, newest first
    async fn list_user_bookings(&self, user_id: UserId) -> FlexSpaceResult<Vec<Booking>>;

    /// Matching bookings, newest first, plus the unpaginated match count
    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> FlexSpaceResult<(Vec<Booking>, u64)>;

    async fn update_booking_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> FlexSpaceResult<Booking>;

    /// Move a pending or paid booking to cancelled in one write.
    /// Returns `None` when the booking already reached a terminal status.
    async fn cancel_booking(&self, id: BookingId) -> FlexSpaceResult<Option<Booking>>;
}

/// Handles onto one backend, split by concern
#[derive(Clone)]
pub struct StorageBackend {
    pub users: Arc<dyn UserStorage>,
    pub rooms: Arc<dyn RoomStorage>,
    pub bookings: Arc<dyn BookingStorage>,
}

impl StorageBackend {
    pub fn memory() -> Self {
        Self::from_shared(Arc::new(MemoryStorage::new()))
    }

    /// Connect to SQLite and create the schema if missing
    #[cfg(feature = "sqlite")]
    pub async fn sqlite(database_url: &str) -> FlexSpaceResult<Self> {
        let storage = SqliteStorage::from_url(database_url).await?;
        storage.create_tables().await?;
        Ok(Self::from_shared(Arc::new(storage)))
    }

    /// SQLite when a URL is configured, memory otherwise
    pub async fn from_url(database_url: Option<&str>) -> FlexSpaceResult<Self> {
        match database_url {
            #[cfg(feature = "sqlite")]
            Some(url) => Self::sqlite(url).await,
            #[cfg(not(feature = "sqlite"))]
            Some(url) => Err(flexspace_core::config_error!(format!(
                "database url '{}' given but the sqlite feature is disabled",
                url
            ))),
            None => Ok(Self::memory()),
        }
    }

    fn from_shared<S>(storage: Arc<S>) -> Self
    where
        S: UserStorage + RoomStorage + BookingStorage + 'static,
    {
        Self {
            users: storage.clone(),
            rooms: storage.clone(),
            bookings: storage,
        }
    }
}
