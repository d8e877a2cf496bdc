//! UseCase: ライブなルームの一覧取得

use std::sync::Arc;

use crate::domain::{RoomId, RoomRegistry, SessionId, UserId};

/// Live room as seen by the inspection endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomOverview {
    pub room_id: RoomId,
    /// Bound sessions, sorted by user then session
    pub members: Vec<(SessionId, UserId)>,
    pub variable_count: usize,
}

impl RoomOverview {
    /// Distinct users bound to the room, ascending
    pub fn users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.members.iter().map(|(_, user)| *user).collect();
        users.dedup();
        users
    }
}

pub struct GetRoomsUseCase {
    registry: Arc<RoomRegistry>,
}

impl GetRoomsUseCase {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self) -> Vec<RoomOverview> {
        let mut rooms = Vec::new();
        for room_id in self.registry.room_ids().await {
            // 一覧取得中に close されたルームは飛ばす
            let Some(room) = self.registry.room(room_id).await else {
                continue;
            };
            rooms.push(RoomOverview {
                room_id,
                members: room.members().await,
                variable_count: room.store().variable_count().await,
            });
        }
        rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repository::InMemoryVariableRepository;
    use kokuban_shared::time::FixedClock;

    #[tokio::test]
    async fn test_get_rooms_lists_live_rooms() {
        // テスト項目: ライブなルームがルーム ID 順に、重複の無いユーザー一覧付きで返される
        // given (前提条件):
        let registry = Arc::new(RoomRegistry::new(
            Arc::new(InMemoryVariableRepository::new()),
            Arc::new(FixedClock::new(0)),
        ));
        // user 1 は 2 タブから接続
        for (room, user) in [(2, 1), (1, 2), (2, 1), (2, 3)] {
            registry
                .join(RoomId::new(room), SessionId::generate(), UserId::new(user))
                .await
                .unwrap();
        }
        let usecase = GetRoomsUseCase::new(registry);

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].room_id, RoomId::new(1));
        assert_eq!(rooms[1].room_id, RoomId::new(2));
        assert_eq!(rooms[1].members.len(), 3);
        assert_eq!(rooms[1].users(), vec![UserId::new(1), UserId::new(3)]);
        assert_eq!(rooms[1].variable_count, 0);
    }

    #[tokio::test]
    async fn test_get_rooms_empty() {
        // テスト項目: ライブなルームが無ければ空
        // given (前提条件):
        let registry = Arc::new(RoomRegistry::new(
            Arc::new(InMemoryVariableRepository::new()),
            Arc::new(FixedClock::new(0)),
        ));
        let usecase = GetRoomsUseCase::new(registry);

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        assert!(rooms.is_empty());
    }
}
