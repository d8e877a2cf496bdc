//! UseCase: 変数更新処理
//!
//! 受け取った更新をルームのステートストアで解決し、状態が変わった場合だけ
//! 送信者を含むルームの全セッションに解決後のレコードをブロードキャストする。
//! 古い更新（Stale）はエラーではなく、黙って捨てられる。

use std::sync::Arc;

use kokuban_shared::time::Clock;

use crate::{
    domain::{MessagePusher, Resolution, RoomDirectory, RoomId, RoomRegistry, Timestamp, UserId},
    infrastructure::dto::websocket::{OutboundMessage, VariableUpdatePayload},
};

use super::{
    error::{RoomAccessError, UpdateVariableError},
    room_guard::ensure_room_active,
};

/// 変数更新のユースケース
pub struct UpdateVariableUseCase {
    directory: Arc<dyn RoomDirectory>,
    registry: Arc<RoomRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl UpdateVariableUseCase {
    pub fn new(
        directory: Arc<dyn RoomDirectory>,
        registry: Arc<RoomRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            registry,
            message_pusher,
            clock,
        }
    }

    /// 変数更新を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Resolution)` - 解決結果（Stale を含む）
    /// * `Err(UpdateVariableError)` - 不正なペイロード、閉じたルーム、永続化の失敗。状態は変わらない
    pub async fn execute(
        &self,
        room_id: RoomId,
        user_id: UserId,
        payload: VariableUpdatePayload,
    ) -> Result<Resolution, UpdateVariableError> {
        let update = payload.into_update(user_id)?;

        ensure_room_active(self.directory.as_ref(), room_id).await?;
        let store = self
            .registry
            .store(room_id)
            .await
            .ok_or(RoomAccessError::Closed(room_id))?;

        // 配信はルームのロック内で行い、確定の順序と配信の順序を揃える
        let registry = Arc::clone(&self.registry);
        let message_pusher = Arc::clone(&self.message_pusher);
        let clock = Arc::clone(&self.clock);
        let resolution = store
            .apply_update(update, move |resolution| async move {
                let now = Timestamp::new(clock.now_millis());
                let message = match OutboundMessage::variable_update(
                    room_id,
                    user_id,
                    resolution.into_record(),
                    now,
                )
                .encode()
                {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::error!("Failed to encode variable update: {}", e);
                        return;
                    }
                };
                let targets = registry.sessions(room_id).await;
                message_pusher.broadcast(targets, &message).await;
            })
            .await?;

        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            MessagePushError, MockMessagePusher, MockVariableRepository, PusherChannel,
            RepositoryError, SessionId, StoreError, VectorClock,
        },
        infrastructure::{
            dto::websocket::ProtocolError,
            message_pusher::WebSocketMessagePusher,
            repository::{InMemoryRoomDirectory, InMemoryVariableRepository},
        },
    };
    use kokuban_shared::time::FixedClock;
    use tokio::sync::{mpsc, oneshot};

    const ROOM: RoomId = RoomId::new(1);

    struct Fixture {
        usecase: UpdateVariableUseCase,
        registry: Arc<RoomRegistry>,
        directory: Arc<InMemoryRoomDirectory>,
    }

    fn create_fixture(pusher: Arc<dyn MessagePusher>) -> Fixture {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(3000));
        let registry = Arc::new(RoomRegistry::new(
            Arc::new(InMemoryVariableRepository::new()),
            clock.clone(),
        ));
        let directory = Arc::new(InMemoryRoomDirectory::with_active_rooms([ROOM]));
        let usecase = UpdateVariableUseCase::new(directory.clone(), registry.clone(), pusher, clock);
        Fixture {
            usecase,
            registry,
            directory,
        }
    }

    fn payload(symbol: &str, value: &str, entries: &[(&str, u64)]) -> VariableUpdatePayload {
        VariableUpdatePayload {
            symbol: symbol.to_string(),
            value: value.to_string(),
            unit: None,
            vector_clock: entries.iter().map(|(k, v)| (*k, *v)).collect::<VectorClock>(),
            source: None,
            verified: false,
        }
    }

    async fn join(
        fixture: &Fixture,
        pusher: &WebSocketMessagePusher,
        user: i64,
    ) -> mpsc::Receiver<String> {
        let session = SessionId::generate();
        let (tx, rx) = mpsc::channel(8);
        fixture
            .registry
            .join(ROOM, session, UserId::new(user))
            .await
            .unwrap();
        pusher.register_client(session, tx).await;
        rx
    }

    #[tokio::test]
    async fn test_accepted_update_is_broadcast_to_all_including_sender() {
        // テスト項目: 受理された更新は送信者を含む全参加者にブロードキャストされる
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let fixture = create_fixture(pusher.clone());
        let mut alice_rx = join(&fixture, &pusher, 1).await;
        let mut bob_rx = join(&fixture, &pusher, 2).await;

        // when (操作):
        let result = fixture
            .usecase
            .execute(ROOM, UserId::new(1), payload("x", "5", &[("1", 1)]))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Ok(Resolution::Created(_))));
        for rx in [&mut alice_rx, &mut bob_rx] {
            let message = OutboundMessage::decode(&rx.recv().await.unwrap()).unwrap();
            let OutboundMessage::VariableUpdate {
                user_id,
                variable_update,
                ..
            } = message
            else {
                panic!("expected variable_update");
            };
            assert_eq!(user_id, 1);
            assert_eq!(variable_update.symbol, "x");
            assert_eq!(variable_update.value, "5");
            assert_eq!(variable_update.updated_by, 1);
            assert_eq!(variable_update.source, "user");
        }
    }

    /// 最初の broadcast を解放されるまで止めておく MessagePusher
    struct GatedPusher {
        delivered: std::sync::Mutex<Vec<String>>,
        entered: std::sync::Mutex<Option<oneshot::Sender<()>>>,
        gate: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl GatedPusher {
        fn new(entered: oneshot::Sender<()>, gate: oneshot::Receiver<()>) -> Self {
            Self {
                delivered: std::sync::Mutex::new(Vec::new()),
                entered: std::sync::Mutex::new(Some(entered)),
                gate: tokio::sync::Mutex::new(Some(gate)),
            }
        }

        fn delivered(&self) -> Vec<String> {
            self.delivered.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl MessagePusher for GatedPusher {
        async fn register_client(&self, _session_id: SessionId, _sender: PusherChannel) {}

        async fn unregister_client(&self, _session_id: &SessionId) {}

        async fn push_to(&self, _session_id: &SessionId, _content: &str) -> Result<(), MessagePushError> {
            Ok(())
        }

        async fn broadcast(&self, _targets: Vec<SessionId>, content: &str) {
            let gate = self.gate.lock().await.take();
            if let Some(gate) = gate {
                let entered = self.entered.lock().unwrap().take();
                if let Some(entered) = entered {
                    let _ = entered.send(());
                }
                let _ = gate.await;
            }
            let OutboundMessage::VariableUpdate {
                variable_update, ..
            } = OutboundMessage::decode(content).unwrap()
            else {
                panic!("expected variable_update");
            };
            self.delivered.lock().unwrap().push(variable_update.value);
        }
    }

    #[tokio::test]
    async fn test_broadcast_order_follows_commit_order() {
        // テスト項目: 同じルームへの更新の配信順は確定順と一致し、最後に届く値がストアの値になる
        // given (前提条件): user 1 の更新 A の配信を止めておく
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let pusher = Arc::new(GatedPusher::new(entered_tx, release_rx));
        let fixture = Arc::new(create_fixture(pusher.clone()));
        fixture
            .registry
            .join(ROOM, SessionId::generate(), UserId::new(1))
            .await
            .unwrap();

        let update_a = {
            let fixture = fixture.clone();
            tokio::spawn(async move {
                fixture
                    .usecase
                    .execute(ROOM, UserId::new(1), payload("x", "A", &[("1", 1)]))
                    .await
            })
        };
        entered_rx.await.unwrap();

        // when (操作): A の配信が止まっている間に、A を知っている user 2 が B を送る
        let update_b = {
            let fixture = fixture.clone();
            tokio::spawn(async move {
                fixture
                    .usecase
                    .execute(ROOM, UserId::new(2), payload("x", "B", &[("1", 1), ("2", 1)]))
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        release_tx.send(()).unwrap();

        // then (期待する結果):
        assert!(matches!(update_a.await.unwrap(), Ok(Resolution::Created(_))));
        assert!(matches!(update_b.await.unwrap(), Ok(Resolution::Accepted(_))));
        assert_eq!(pusher.delivered(), vec!["A", "B"]);
        let store = fixture.registry.store(ROOM).await.unwrap();
        assert_eq!(store.snapshot().await[0].value, "B");
    }

    #[tokio::test]
    async fn test_stale_update_is_not_broadcast() {
        // テスト項目: 古い更新は黙って捨てられ、ブロードキャストされない
        // given (前提条件):
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().times(1).returning(|_, _| ());
        let fixture = create_fixture(Arc::new(pusher));
        fixture
            .registry
            .join(ROOM, SessionId::generate(), UserId::new(1))
            .await
            .unwrap();
        fixture
            .usecase
            .execute(ROOM, UserId::new(1), payload("x", "5", &[("1", 2)]))
            .await
            .unwrap();

        // when (操作):
        let result = fixture
            .usecase
            .execute(ROOM, UserId::new(2), payload("x", "1", &[("1", 1)]))
            .await;

        // then (期待する結果): broadcast は最初の 1 回だけ
        let resolution = result.unwrap();
        assert!(matches!(resolution, Resolution::Stale(_)));
        assert_eq!(resolution.record().value, "5");
    }

    #[tokio::test]
    async fn test_concurrent_update_is_merged_and_broadcast() {
        // テスト項目: 並行な更新は LWW で受理され、クロックが merge されて配信される
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let fixture = create_fixture(pusher.clone());
        let mut rx = join(&fixture, &pusher, 1).await;
        fixture
            .usecase
            .execute(ROOM, UserId::new(1), payload("x", "5", &[("1", 1), ("2", 0)]))
            .await
            .unwrap();
        rx.recv().await.unwrap();

        // when (操作):
        let result = fixture
            .usecase
            .execute(ROOM, UserId::new(2), payload("x", "9", &[("1", 0), ("2", 1)]))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Ok(Resolution::Merged(_))));
        let OutboundMessage::VariableUpdate {
            variable_update, ..
        } = OutboundMessage::decode(&rx.recv().await.unwrap()).unwrap()
        else {
            panic!("expected variable_update");
        };
        assert_eq!(variable_update.value, "9");
        assert_eq!(variable_update.vector_clock.get("1"), 1);
        assert_eq!(variable_update.vector_clock.get("2"), 1);
    }

    #[tokio::test]
    async fn test_closed_room_refuses_updates() {
        // テスト項目: Closed のルームへの更新はエラーになり、状態は変わらない
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let fixture = create_fixture(pusher.clone());
        let _rx = join(&fixture, &pusher, 1).await;
        fixture.directory.close(ROOM).await.unwrap();

        // when (操作):
        let result = fixture
            .usecase
            .execute(ROOM, UserId::new(1), payload("x", "5", &[("1", 1)]))
            .await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            UpdateVariableError::Room(RoomAccessError::Closed(ROOM))
        );
        let store = fixture.registry.store(ROOM).await.unwrap();
        assert_eq!(store.variable_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_symbol_is_rejected() {
        // テスト項目: 空のシンボルは InvalidPayload になり、ブロードキャストされない
        // given (前提条件):
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        let fixture = create_fixture(Arc::new(pusher));

        // when (操作):
        let result = fixture
            .usecase
            .execute(ROOM, UserId::new(1), payload("", "5", &[("1", 1)]))
            .await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(UpdateVariableError::InvalidPayload(ProtocolError::InvalidSymbol(_)))
        ));
    }

    #[tokio::test]
    async fn test_persistence_failure_is_reported() {
        // テスト項目: 永続化に失敗した更新はエラーになり、ブロードキャストされない
        // given (前提条件):
        let mut repository = MockVariableRepository::new();
        repository.expect_load_all().returning(|_| Ok(vec![]));
        repository
            .expect_upsert()
            .returning(|_| Err(RepositoryError::Unavailable("db down".to_string())));
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(0));
        let registry = Arc::new(RoomRegistry::new(Arc::new(repository), clock.clone()));
        registry
            .join(ROOM, SessionId::generate(), UserId::new(1))
            .await
            .unwrap();
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        let usecase = UpdateVariableUseCase::new(
            Arc::new(InMemoryRoomDirectory::with_active_rooms([ROOM])),
            registry,
            Arc::new(pusher),
            clock,
        );

        // when (操作):
        let result = usecase
            .execute(ROOM, UserId::new(1), payload("x", "5", &[("1", 1)]))
            .await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            UpdateVariableError::Store(StoreError::Persistence(RepositoryError::Unavailable(
                "db down".to_string()
            )))
        );
    }
}
