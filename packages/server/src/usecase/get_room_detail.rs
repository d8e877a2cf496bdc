//! UseCase: ルーム詳細・変数一覧の取得

use std::sync::Arc;

use crate::domain::{RoomId, RoomRegistry, VariableRecord};

use super::{error::GetRoomDetailError, get_rooms::RoomOverview};

pub struct GetRoomDetailUseCase {
    registry: Arc<RoomRegistry>,
}

impl GetRoomDetailUseCase {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self, room_id: RoomId) -> Result<RoomOverview, GetRoomDetailError> {
        let room = self
            .registry
            .room(room_id)
            .await
            .ok_or(GetRoomDetailError::RoomNotFound(room_id))?;

        Ok(RoomOverview {
            room_id,
            members: room.members().await,
            variable_count: room.store().variable_count().await,
        })
    }

    /// Snapshot of the room's variables, ordered by symbol
    pub async fn variables(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<VariableRecord>, GetRoomDetailError> {
        let store = self
            .registry
            .store(room_id)
            .await
            .ok_or(GetRoomDetailError::RoomNotFound(room_id))?;
        Ok(store.snapshot().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{SessionId, Symbol, UserId, VariableUpdate, VectorClock},
        infrastructure::repository::InMemoryVariableRepository,
    };
    use kokuban_shared::time::FixedClock;

    fn create_test_usecase() -> (GetRoomDetailUseCase, Arc<RoomRegistry>) {
        let registry = Arc::new(RoomRegistry::new(
            Arc::new(InMemoryVariableRepository::new()),
            Arc::new(FixedClock::new(0)),
        ));
        (GetRoomDetailUseCase::new(registry.clone()), registry)
    }

    #[tokio::test]
    async fn test_get_room_detail_success() {
        // テスト項目: ライブなルームの詳細と変数一覧が取得できる
        // given (前提条件):
        let (usecase, registry) = create_test_usecase();
        let room_id = RoomId::new(1);
        let store = registry
            .join(room_id, SessionId::generate(), UserId::new(1))
            .await
            .unwrap();
        store
            .apply_update(
                VariableUpdate {
                    symbol: Symbol::new("g".to_string()).unwrap(),
                    value: "9.8".to_string(),
                    unit: Some("m/s^2".to_string()),
                    vector_clock: [("1", 1)].into_iter().collect::<VectorClock>(),
                    source: "ai".to_string(),
                    verified: true,
                    updated_by: UserId::new(1),
                },
                |_| async {},
            )
            .await
            .unwrap();

        // when (操作):
        let detail = usecase.execute(room_id).await.unwrap();
        let variables = usecase.variables(room_id).await.unwrap();

        // then (期待する結果):
        assert_eq!(detail.members.len(), 1);
        assert_eq!(detail.variable_count, 1);
        assert_eq!(variables.len(), 1);
        assert_eq!(variables[0].unit.as_deref(), Some("m/s^2"));
        assert!(variables[0].is_verified);
    }

    #[tokio::test]
    async fn test_get_room_detail_not_found() {
        // テスト項目: ライブでないルームは RoomNotFound
        // given (前提条件):
        let (usecase, _registry) = create_test_usecase();

        // when (操作):
        let detail = usecase.execute(RoomId::new(9)).await;
        let variables = usecase.variables(RoomId::new(9)).await;

        // then (期待する結果):
        assert_eq!(detail, Err(GetRoomDetailError::RoomNotFound(RoomId::new(9))));
        assert_eq!(variables, Err(GetRoomDetailError::RoomNotFound(RoomId::new(9))));
    }
}
