//! Bookings and the booking status state machine
//!
//! `pending` moves to `paid` or `cancelled`, and either of those to `done`.
//! Admins write any status. Owners may only cancel, and only before a terminal state.

use crate::storage::{BookingStorage, RoomStorage};
use chrono::{DateTime, Utc};
use flexspace_core::{
    price_for_interval, Booking, BookingFilter, BookingId, BookingStatus, FlexSpaceError,
    FlexSpaceResult, NewBooking, Page, PageRequest, RoomId, UserId, UserRole,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct BookingService {
    bookings: Arc<dyn BookingStorage>,
    rooms: Arc<dyn RoomStorage>,
}

impl BookingService {
    pub fn new(bookings: Arc<dyn BookingStorage>, rooms: Arc<dyn RoomStorage>) -> Self {
        Self { bookings, rooms }
    }

    pub async fn create(
        &self,
        user_id: UserId,
        room_id: RoomId,
        date_start: DateTime<Utc>,
        date_end: DateTime<Utc>,
    ) -> FlexSpaceResult<Booking> {
        if date_end <= date_start {
            return Err(FlexSpaceError::validation(
                "dateEnd",
                "dateEnd must be after dateStart",
            ));
        }

        let room = self
            .rooms
            .find_room(room_id)
            .await?
            .ok_or_else(|| FlexSpaceError::not_found(format!("Room {}", room_id)))?;

        let booking = self
            .bookings
            .create_booking(NewBooking {
                user_id,
                room_id,
                date_start,
                date_end,
                total_price: price_for_interval(room.price_hour, date_start, date_end),
            })
            .await?;

        info!(
            "User {} booked room {} as booking {} for {}",
            user_id, room_id, booking.id, booking.total_price
        );
        Ok(booking)
    }

    pub async fn my(&self, user_id: UserId) -> FlexSpaceResult<Vec<Booking>> {
        self.bookings.list_user_bookings(user_id).await
    }

    pub async fn list(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> FlexSpaceResult<Page<Booking>> {
        let (data, total) = self.bookings.list_bookings(filter, page).await?;
        Ok(Page::new(data, total, page))
    }

    async fn load(&self, id: BookingId) -> FlexSpaceResult<Booking> {
        self.bookings
            .find_booking(id)
            .await?
            .ok_or_else(|| FlexSpaceError::not_found(format!("Booking {}", id)))
    }

    /// Visible to its owner and to admins
    pub async fn get(
        &self,
        id: BookingId,
        requester: UserId,
        role: UserRole,
    ) -> FlexSpaceResult<Booking> {
        let booking = self.load(id).await?;
        if booking.user_id != requester && !role.is_admin() {
            warn!("User {} tried to read booking {}", requester, id);
            return Err(FlexSpaceError::forbidden("not your booking"));
        }
        Ok(booking)
    }

    /// Owner cancellation. A cancelled or done booking is left untouched.
    pub async fn cancel(&self, id: BookingId, requester: UserId) -> FlexSpaceResult<Booking> {
        let booking = self.load(id).await?;
        if booking.user_id != requester {
            warn!("User {} tried to cancel booking {}", requester, id);
            return Err(FlexSpaceError::forbidden("not your booking"));
        }
        if !booking.status.can_cancel() {
            return Err(not_cancellable(booking.status));
        }

        // An admin may have finished the booking since it was loaded.
        match self.bookings.cancel_booking(id).await? {
            Some(booking) => {
                info!("Booking {} cancelled by its owner", id);
                Ok(booking)
            }
            None => {
                let current = self.load(id).await?;
                warn!("Booking {} became {} before it was cancelled", id, current.status);
                Err(not_cancellable(current.status))
            }
        }
    }

    /// Admin status write, unconstrained by the state machine
    pub async fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> FlexSpaceResult<Booking> {
        let booking = self.bookings.update_booking_status(id, status).await?;
        info!("Booking {} set to {}", id, status);
        Ok(booking)
    }
}

fn not_cancellable(status: BookingStatus) -> FlexSpaceError {
    FlexSpaceError::validation("status", format!("a {} booking cannot be cancelled", status))
}
