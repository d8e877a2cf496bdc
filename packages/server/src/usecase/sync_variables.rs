//! UseCase: 変数の同期処理
//!
//! `sync_request` に対し、ルームの全変数のスナップショットを要求者にだけ返す。
//! 再接続したクライアントはこれで状態を取り直す。

use std::sync::Arc;

use kokuban_shared::time::Clock;

use crate::{
    domain::{MessagePusher, RoomId, RoomRegistry, SessionId, Timestamp, UserId},
    infrastructure::dto::websocket::OutboundMessage,
};

use super::error::{RoomAccessError, SyncError};

/// 変数同期のユースケース
pub struct SyncVariablesUseCase {
    registry: Arc<RoomRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SyncVariablesUseCase {
    pub fn new(
        registry: Arc<RoomRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            clock,
        }
    }

    /// スナップショットを `sync_response` として要求者に送信し、変数の数を返す
    pub async fn execute(
        &self,
        room_id: RoomId,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<usize, SyncError> {
        // ライブなステートが無いのは close 済みのルームだけ
        let store = self
            .registry
            .store(room_id)
            .await
            .ok_or(RoomAccessError::Closed(room_id))?;

        let variables = store.snapshot().await;
        let count = variables.len();
        let now = Timestamp::new(self.clock.now_millis());
        let message = OutboundMessage::sync_response(room_id, user_id, variables, now).encode()?;
        self.message_pusher.push_to(&session_id, &message).await?;

        tracing::debug!(
            "Sent {} variables of room {} to session {}",
            count,
            room_id,
            session_id
        );
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Symbol, VariableUpdate, VectorClock},
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryVariableRepository,
        },
    };
    use kokuban_shared::time::FixedClock;
    use tokio::sync::mpsc;

    const ROOM: RoomId = RoomId::new(1);

    fn update(symbol: &str, value: &str, user: i64) -> VariableUpdate {
        VariableUpdate {
            symbol: Symbol::new(symbol.to_string()).unwrap(),
            value: value.to_string(),
            unit: Some("m".to_string()),
            vector_clock: [(user.to_string(), 1)].into_iter().collect::<VectorClock>(),
            source: "user".to_string(),
            verified: false,
            updated_by: UserId::new(user),
        }
    }

    fn create_test_usecase() -> (SyncVariablesUseCase, Arc<RoomRegistry>, Arc<WebSocketMessagePusher>) {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(4000));
        let registry = Arc::new(RoomRegistry::new(
            Arc::new(InMemoryVariableRepository::new()),
            clock.clone(),
        ));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = SyncVariablesUseCase::new(registry.clone(), pusher.clone(), clock);
        (usecase, registry, pusher)
    }

    #[tokio::test]
    async fn test_sync_returns_all_accepted_variables_to_requester() {
        // テスト項目: 2 つの更新が受理された後の sync_request は、その 2 レコードを要求者にだけ返す
        // given (前提条件):
        let (usecase, registry, pusher) = create_test_usecase();
        let alice = SessionId::generate();
        let bob = SessionId::generate();
        let (alice_tx, mut alice_rx) = mpsc::channel(8);
        let (bob_tx, mut bob_rx) = mpsc::channel(8);
        let store = registry.join(ROOM, alice, UserId::new(1)).await.unwrap();
        registry.join(ROOM, bob, UserId::new(2)).await.unwrap();
        pusher.register_client(alice, alice_tx).await;
        pusher.register_client(bob, bob_tx).await;
        store.apply_update(update("v0", "3", 1), |_| async {}).await.unwrap();
        store.apply_update(update("a", "9.8", 2), |_| async {}).await.unwrap();

        // when (操作):
        let result = usecase.execute(ROOM, UserId::new(1), alice).await;

        // then (期待する結果):
        assert_eq!(result, Ok(2));
        let OutboundMessage::SyncResponse {
            user_id, variables, ..
        } = OutboundMessage::decode(&alice_rx.recv().await.unwrap()).unwrap()
        else {
            panic!("expected sync_response");
        };
        assert_eq!(user_id, 1);
        let symbols: Vec<&str> = variables.iter().map(|v| v.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["a", "v0"]);
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sync_on_closed_room_fails() {
        // テスト項目: ステートが破棄されたルームでの sync_request はエラーになる
        // given (前提条件):
        let (usecase, registry, _pusher) = create_test_usecase();
        let session = SessionId::generate();
        registry.join(ROOM, session, UserId::new(1)).await.unwrap();
        registry.evict(ROOM).await;

        // when (操作):
        let result = usecase.execute(ROOM, UserId::new(1), session).await;

        // then (期待する結果):
        assert_eq!(result, Err(SyncError::Room(RoomAccessError::Closed(ROOM))));
    }
}
