//! InMemory Room Directory 実装
//!
//! ルームの作成・一覧などの CRUD は外部サービスの責務。
//! ここでは Active / Closed のライフサイクルだけを保持する。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{RepositoryError, RoomDirectory, RoomId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoomStatus {
    Active,
    Closed,
}

#[derive(Default)]
pub struct InMemoryRoomDirectory {
    rooms: RwLock<HashMap<RoomId, RoomStatus>>,
}

impl InMemoryRoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory pre-populated with active rooms
    pub fn with_active_rooms(room_ids: impl IntoIterator<Item = RoomId>) -> Self {
        let rooms = room_ids
            .into_iter()
            .map(|id| (id, RoomStatus::Active))
            .collect();
        Self {
            rooms: RwLock::new(rooms),
        }
    }

    /// Register a room as active. Closed rooms stay closed.
    pub async fn open(&self, room_id: RoomId) {
        let mut rooms = self.rooms.write().await;
        rooms.entry(room_id).or_insert(RoomStatus::Active);
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomDirectory {
    async fn is_active(&self, room_id: RoomId) -> Result<bool, RepositoryError> {
        let rooms = self.rooms.read().await;
        match rooms.get(&room_id) {
            Some(status) => Ok(*status == RoomStatus::Active),
            None => Err(RepositoryError::RoomNotFound(room_id)),
        }
    }

    async fn close(&self, room_id: RoomId) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.write().await;
        let status = rooms
            .get_mut(&room_id)
            .ok_or(RepositoryError::RoomNotFound(room_id))?;
        *status = RoomStatus::Closed;
        Ok(())
    }
}
