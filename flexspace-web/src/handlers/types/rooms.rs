//! Room endpoint payloads

use flexspace_core::{RoomFilter, RoomType};
use serde::Deserialize;
use utoipa::IntoParams;

/// Catalog filters, all optional
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RoomListParams {
    /// desk, vip, meeting or conference
    #[serde(rename = "type")]
    pub room_type: Option<RoomType>,
    pub min_capacity: Option<i64>,
    pub max_capacity: Option<i64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Case-insensitive match on name or description
    pub search: Option<String>,
}

impl From<RoomListParams> for RoomFilter {
    fn from(params: RoomListParams) -> Self {
        RoomFilter {
            room_type: params.room_type,
            min_capacity: params.min_capacity,
            max_capacity: params.max_capacity,
            min_price: params.min_price,
            max_price: params.max_price,
            search: params.search,
        }
    }
}
