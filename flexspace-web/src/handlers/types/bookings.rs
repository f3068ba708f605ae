//! Booking endpoint payloads

use chrono::{DateTime, Utc};
use flexspace_core::{Booking, BookingStatus, Page, RoomId};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub room_id: RoomId,
    pub date_start: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

/// Admin booking listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookingListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<BookingStatus>,
    /// Only bookings starting at or after this instant
    pub date_start: Option<DateTime<Utc>>,
    /// Only bookings ending at or before this instant
    pub date_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingPageResponse {
    pub data: Vec<Booking>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl From<Page<Booking>> for BookingPageResponse {
    fn from(page: Page<Booking>) -> Self {
        Self {
            data: page.data,
            total: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}
