//! ライブなルームのレジストリ
//!
//! ルーム ID から `RoomStateStore` とバインド中のセッションを引く。
//! ステートは最初の参加時に作られ、ルームの close 時に破棄される。

use std::{collections::HashMap, sync::Arc};

use kokuban_shared::time::Clock;
use tokio::sync::{Mutex, RwLock};

use super::{RoomId, RoomStateStore, SessionId, StoreError, UserId, VariableRepository};

/// A room with at least one join since startup (or since it was last evicted)
pub struct LiveRoom {
    store: Arc<RoomStateStore>,
    sessions: Mutex<HashMap<SessionId, UserId>>,
}

impl LiveRoom {
    fn new(store: RoomStateStore) -> Self {
        Self {
            store: Arc::new(store),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> Arc<RoomStateStore> {
        Arc::clone(&self.store)
    }

    /// Bound sessions with their users, sorted by user then session
    pub async fn members(&self) -> Vec<(SessionId, UserId)> {
        let sessions = self.sessions.lock().await;
        let mut members: Vec<(SessionId, UserId)> =
            sessions.iter().map(|(s, u)| (*s, *u)).collect();
        members.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        members
    }
}

pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, Arc<LiveRoom>>>,
    repository: Arc<dyn VariableRepository>,
    clock: Arc<dyn Clock>,
}

impl RoomRegistry {
    pub fn new(repository: Arc<dyn VariableRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            repository,
            clock,
        }
    }

    /// Bind a session to a room, creating the room's state on first join.
    pub async fn join(
        &self,
        room_id: RoomId,
        session_id: SessionId,
        user_id: UserId,
    ) -> Result<Arc<RoomStateStore>, StoreError> {
        let room = self.get_or_load(room_id).await?;
        room.sessions.lock().await.insert(session_id, user_id);
        tracing::debug!(
            "Session {} (user {}) bound to room {}",
            session_id,
            user_id,
            room_id
        );
        Ok(room.store())
    }

    /// Unbind a session. Returns the user it was bound to and the sessions left in the room.
    pub async fn leave(
        &self,
        room_id: RoomId,
        session_id: &SessionId,
    ) -> Option<(UserId, Vec<SessionId>)> {
        let room = self.room(room_id).await?;
        let mut sessions = room.sessions.lock().await;
        let user_id = sessions.remove(session_id)?;
        let remaining = sessions.keys().copied().collect();
        Some((user_id, remaining))
    }

    pub async fn room(&self, room_id: RoomId) -> Option<Arc<LiveRoom>> {
        self.rooms.read().await.get(&room_id).cloned()
    }

    pub async fn store(&self, room_id: RoomId) -> Option<Arc<RoomStateStore>> {
        self.room(room_id).await.map(|room| room.store())
    }

    /// Sessions currently bound to the room (empty when the room is not live)
    pub async fn sessions(&self, room_id: RoomId) -> Vec<SessionId> {
        match self.room(room_id).await {
            Some(room) => room.sessions.lock().await.keys().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Evict the room's state and session set; returns the members that were bound.
    pub async fn evict(&self, room_id: RoomId) -> Vec<(SessionId, UserId)> {
        let Some(room) = self.rooms.write().await.remove(&room_id) else {
            return Vec::new();
        };
        let sessions: Vec<(SessionId, UserId)> = room.sessions.lock().await.drain().collect();
        tracing::info!(
            "Room {} evicted ({} sessions unbound)",
            room_id,
            sessions.len()
        );
        sessions
    }

    /// Ids of all live rooms, ascending
    pub async fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    async fn get_or_load(&self, room_id: RoomId) -> Result<Arc<LiveRoom>, StoreError> {
        if let Some(room) = self.room(room_id).await {
            return Ok(room);
        }

        // 他のルームをブロックしないよう、ロックを持たずに読み込む
        let store =
            RoomStateStore::load(room_id, self.repository.clone(), self.clock.clone()).await?;

        let mut rooms = self.rooms.write().await;
        let room = rooms
            .entry(room_id)
            .or_insert_with(|| {
                tracing::info!("Room {} state created", room_id);
                Arc::new(LiveRoom::new(store))
            })
            .clone();
        Ok(room)
    }
}
