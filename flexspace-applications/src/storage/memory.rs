//! In-memory storage backend

use super::{BookingStorage, RoomStorage, UserStorage};
use async_trait::async_trait;
use chrono::Utc;
use flexspace_core::{
    Booking, BookingFilter, BookingId, BookingStatus, FlexSpaceError, FlexSpaceResult,
    NewBooking, NewRoom, NewUser, PageRequest, Room, RoomFilter, RoomId, User, UserFilter, UserId,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    rooms: BTreeMap<RoomId, Room>,
    bookings: BTreeMap<BookingId, Booking>,
    next_user_id: i64,
    next_room_id: i64,
    next_booking_id: i64,
}

impl MemoryState {
    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id) != except)
    }

    fn slug_taken(&self, slug: &str, except: Option<RoomId>) -> bool {
        self.rooms
            .values()
            .any(|r| r.slug == slug && Some(r.id) != except)
    }

    fn user_mut(&mut self, id: UserId) -> FlexSpaceResult<&mut User> {
        self.users
            .get_mut(&id)
            .ok_or_else(|| FlexSpaceError::not_found(format!("User {}", id)))
    }
}

/// Storage held entirely in process memory, lost on restart
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let data = items
        .into_iter()
        .skip(page.offset())
        .take(page.limit as usize)
        .collect();
    (data, total)
}

#[async_trait]
impl UserStorage for MemoryStorage {
    async fn create_user(&self, user: NewUser) -> FlexSpaceResult<User> {
        let mut state = self.state.write().await;
        if state.email_taken(&user.email, None) {
            return Err(FlexSpaceError::conflict("email already registered"));
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.next_user_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            token_version: 0,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        debug!("Stored user {} in memory", user.id);
        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> FlexSpaceResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> FlexSpaceResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> FlexSpaceResult<(Vec<User>, u64)> {
        let state = self.state.read().await;
        let matching = state
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        Ok(paginate(matching, page))
    }

    async fn update_user(&self, user: &User) -> FlexSpaceResult<User> {
        let mut state = self.state.write().await;
        if state.email_taken(&user.email, Some(user.id)) {
            return Err(FlexSpaceError::conflict("email already registered"));
        }
        let stored = state.user_mut(user.id)?;
        stored.name = user.name.clone();
        stored.email = user.email.clone();
        stored.role = user.role;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
        revoke_tokens: bool,
    ) -> FlexSpaceResult<()> {
        let mut state = self.state.write().await;
        let stored = state.user_mut(id)?;
        stored.password_hash = password_hash.to_string();
        if revoke_tokens {
            stored.token_version += 1;
        }
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn increment_token_version(&self, id: UserId) -> FlexSpaceResult<i64> {
        let mut state = self.state.write().await;
        let stored = state.user_mut(id)?;
        stored.token_version += 1;
        Ok(stored.token_version)
    }

    async fn rotate_token_version(
        &self,
        id: UserId,
        expected: i64,
    ) -> FlexSpaceResult<Option<i64>> {
        let mut state = self.state.write().await;
        let stored = state.user_mut(id)?;
        if stored.token_version != expected {
            return Ok(None);
        }
        stored.token_version += 1;
        Ok(Some(stored.token_version))
    }

    async fn delete_user(&self, id: UserId) -> FlexSpaceResult<()> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Err(FlexSpaceError::not_found(format!("User {}", id)));
        }
        state.bookings.retain(|_, b| b.user_id != id);
        debug!("Deleted user {} from memory", id);
        Ok(())
    }
}

#[async_trait]
impl RoomStorage for MemoryStorage {
    async fn create_room(&self, room: NewRoom) -> FlexSpaceResult<Room> {
        let mut state = self.state.write().await;
        if state.slug_taken(&room.slug, None) {
            return Err(FlexSpaceError::conflict("slug already in use"));
        }

        state.next_room_id += 1;
        let now = Utc::now();
        let room = Room {
            id: state.next_room_id,
            slug: room.slug,
            name: room.name,
            room_type: room.room_type,
            capacity: room.capacity,
            price_hour: room.price_hour,
            description: room.description,
            amenities: room.amenities,
            photos: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn find_room(&self, id: RoomId) -> FlexSpaceResult<Option<Room>> {
        Ok(self.state.read().await.rooms.get(&id).cloned())
    }

    async fn find_room_by_slug(&self, slug: &str) -> FlexSpaceResult<Option<Room>> {
        let state = self.state.read().await;
        Ok(state.rooms.values().find(|r| r.slug == slug).cloned())
    }

    async fn list_rooms(&self, filter: &RoomFilter) -> FlexSpaceResult<Vec<Room>> {
        let state = self.state.read().await;
        Ok(state
            .rooms
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn update_room(&self, room: &Room) -> FlexSpaceResult<Room> {
        let mut state = self.state.write().await;
        if state.slug_taken(&room.slug, Some(room.id)) {
            return Err(FlexSpaceError::conflict("slug already in use"));
        }
        let stored = state
            .rooms
            .get_mut(&room.id)
            .ok_or_else(|| FlexSpaceError::not_found(format!("Room {}", room.id)))?;
        *stored = Room {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..room.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_room(&self, id: RoomId) -> FlexSpaceResult<()> {
        let mut state = self.state.write().await;
        if state.rooms.remove(&id).is_none() {
            return Err(FlexSpaceError::not_found(format!("Room {}", id)));
        }
        state.bookings.retain(|_, b| b.room_id != id);
        Ok(())
    }
}

#[async_trait]
impl BookingStorage for MemoryStorage {
    async fn create_booking(&self, booking: NewBooking) -> FlexSpaceResult<Booking> {
        let mut state = self.state.write().await;
        let clash = state.bookings.values().any(|b| {
            b.room_id == booking.room_id
                && b.status != BookingStatus::Cancelled
                && b.overlaps(booking.date_start, booking.date_end)
        });
        if clash {
            return Err(FlexSpaceError::conflict(
                "room is already booked for this time",
            ));
        }

        state.next_booking_id += 1;
        let now = Utc::now();
        let booking = Booking {
            id: state.next_booking_id,
            user_id: booking.user_id,
            room_id: booking.room_id,
            date_start: booking.date_start,
            date_end: booking.date_end,
            total_price: booking.total_price,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_booking(&self, id: BookingId) -> FlexSpaceResult<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn list_user_bookings(&self, user_id: UserId) -> FlexSpaceResult<Vec<Booking>> {
        let state = self.state.read().await;
        Ok(state
            .bookings
            .values()
            .rev()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> FlexSpaceResult<(Vec<Booking>, u64)> {
        let state = self.state.read().await;
        let matching = state
            .bookings
            .values()
            .rev()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        Ok(paginate(matching, page))
    }

    async fn update_booking_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> FlexSpaceResult<Booking> {
        let mut state = self.state.write().await;
        let stored = state
            .bookings
            .get_mut(&id)
            .ok_or_else(|| FlexSpaceError::not_found(format!("Booking {}", id)))?;
        stored.status = status;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn cancel_booking(&self, id: BookingId) -> FlexSpaceResult<Option<Booking>> {
        let mut state = self.state.write().await;
        let stored = state
            .bookings
            .get_mut(&id)
            .ok_or_else(|| FlexSpaceError::not_found(format!("Booking {}", id)))?;
        if !stored.status.can_cancel() {
            return Ok(None);
        }
        stored.status = BookingStatus::Cancelled;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }
}
