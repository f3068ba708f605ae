//! Room catalog

use crate::storage::RoomStorage;
use flexspace_core::validation::{validate_new_room, validate_room_patch};
use flexspace_core::{
    FlexSpaceError, FlexSpaceResult, NewRoom, Room, RoomFilter, RoomId, RoomPatch,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Upper bound on photos attached to one room
pub const MAX_PHOTOS_PER_ROOM: usize = 10;

#[derive(Clone)]
pub struct RoomService {
    storage: Arc<dyn RoomStorage>,
}

impl RoomService {
    pub fn new(storage: Arc<dyn RoomStorage>) -> Self {
        Self { storage }
    }

    pub async fn list(&self, filter: &RoomFilter) -> FlexSpaceResult<Vec<Room>> {
        let rooms = self.storage.list_rooms(filter).await?;
        debug!("Room query matched {} rooms", rooms.len());
        Ok(rooms)
    }

    pub async fn get(&self, id: RoomId) -> FlexSpaceResult<Room> {
        self.storage
            .find_room(id)
            .await?
            .ok_or_else(|| FlexSpaceError::not_found(format!("Room {}", id)))
    }

    pub async fn get_by_slug(&self, slug: &str) -> FlexSpaceResult<Room> {
        self.storage
            .find_room_by_slug(slug)
            .await?
            .ok_or_else(|| FlexSpaceError::not_found(format!("Room '{}'", slug)))
    }

    pub async fn create(&self, room: NewRoom) -> FlexSpaceResult<Room> {
        validate_new_room(&room)?;
        let room = self.storage.create_room(room).await?;
        info!("Created room {} ({})", room.id, room.slug);
        Ok(room)
    }

    pub async fn update(&self, id: RoomId, patch: RoomPatch) -> FlexSpaceResult<Room> {
        validate_room_patch(&patch)?;
        let mut room = self.get(id).await?;
        patch.apply(&mut room);
        let room = self.storage.update_room(&room).await?;
        info!("Updated room {}", room.id);
        Ok(room)
    }

    pub async fn delete(&self, id: RoomId) -> FlexSpaceResult<()> {
        self.storage.delete_room(id).await?;
        info!("Deleted room {}", id);
        Ok(())
    }

    /// How many more photos the room accepts
    pub async fn photo_slots(&self, id: RoomId) -> FlexSpaceResult<usize> {
        let room = self.get(id).await?;
        Ok(MAX_PHOTOS_PER_ROOM.saturating_sub(room.photos.len()))
    }

    /// Append photo URLs. BadRequest when the room would exceed its photo limit.
    pub async fn add_photos(&self, id: RoomId, urls: Vec<String>) -> FlexSpaceResult<Room> {
        let mut room = self.get(id).await?;
        if room.photos.len() + urls.len() > MAX_PHOTOS_PER_ROOM {
            return Err(FlexSpaceError::validation(
                "photos",
                format!("a room holds at most {} photos", MAX_PHOTOS_PER_ROOM),
            ));
        }
        let added = urls.len();
        room.photos.extend(urls);
        let room = self.storage.update_room(&room).await?;
        info!("Attached {} photos to room {}", added, room.id);
        Ok(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use flexspace_core::RoomType;

    fn desk(slug: &str, price_hour: f64) -> NewRoom {
        NewRoom {
            slug: slug.to_string(),
            name: format!("Desk {}", slug),
            room_type: RoomType::Desk,
            capacity: 1,
            price_hour,
            description: None,
            amenities: vec!["wifi".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_validates_and_rejects_duplicate_slug() {
        let rooms = RoomService::new(Arc::new(MemoryStorage::new()));
        rooms.create(desk("window-desk", 5.0)).await.unwrap();

        let err = rooms.create(desk("window-desk", 5.0)).await.unwrap_err();
        assert_eq!(err.http_status(), 409);

        let err = rooms.create(desk("Window Desk", 5.0)).await.unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn test_filters_and_slug_lookup() {
        let rooms = RoomService::new(Arc::new(MemoryStorage::new()));
        rooms.create(desk("cheap", 3.0)).await.unwrap();
        rooms.create(desk("pricey", 30.0)).await.unwrap();

        let filter = RoomFilter {
            max_price: Some(10.0),
            ..Default::default()
        };
        let found = rooms.list(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug, "cheap");

        assert_eq!(rooms.get_by_slug("pricey").await.unwrap().price_hour, 30.0);
        assert_eq!(rooms.get_by_slug("missing").await.unwrap_err().http_status(), 404);
    }

    #[tokio::test]
    async fn test_update_keeps_untouched_fields() {
        let rooms = RoomService::new(Arc::new(MemoryStorage::new()));
        let room = rooms.create(desk("corner", 4.0)).await.unwrap();
        let updated = rooms
            .update(
                room.id,
                RoomPatch {
                    capacity: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.capacity, 2);
        assert_eq!(updated.slug, "corner");
        assert_eq!(updated.amenities, vec!["wifi".to_string()]);
    }

    #[tokio::test]
    async fn test_photo_limit() {
        let rooms = RoomService::new(Arc::new(MemoryStorage::new()));
        let room = rooms.create(desk("gallery", 4.0)).await.unwrap();
        let urls: Vec<String> = (0..8).map(|i| format!("/uploads/rooms/{}.png", i)).collect();
        rooms.add_photos(room.id, urls).await.unwrap();
        assert_eq!(rooms.photo_slots(room.id).await.unwrap(), 2);

        let too_many: Vec<String> = (0..3).map(|i| format!("/uploads/rooms/x{}.png", i)).collect();
        let err = rooms.add_photos(room.id, too_many).await.unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert_eq!(rooms.get(room.id).await.unwrap().photos.len(), 8);
    }
}
