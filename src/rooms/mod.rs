use std::sync::Arc;

use crate::{
    models::Room,
    store::{MemoryDb, StoreError},
};

/// Mock multiplayer rooms kept in the store
#[derive(Debug, Clone)]
pub struct RoomService {
    store: Arc<MemoryDb>,
}

impl RoomService {
    pub fn new(store: Arc<MemoryDb>) -> Self {
        Self { store }
    }

    /// Return the room, creating it on the first visit
    pub fn get_or_create(&self, room_id: &str) -> Result<Room, StoreError> {
        let key = Room::store_key(room_id);
        if let Some(room) = self.store.load::<Room>(&key) {
            return Ok(room);
        }

        let room = self.store.update(&key, || Room::new(room_id), |_| {})?;
        tracing::info!("Opened room {}", room.room_id);
        Ok(room)
    }
}
