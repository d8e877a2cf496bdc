//! UseCase: 参加者切断処理
//!
//! 切断・アイドルタイムアウト・バックプレッシャーによる切断のいずれでも呼ばれる。
//! ルームのステートは参加者がいなくなっても保持し、ルームの close 時にだけ破棄する。

use std::sync::Arc;

use kokuban_shared::time::Clock;

use crate::{
    domain::{MessagePusher, RoomId, RoomRegistry, SessionId, Timestamp, UserId},
    infrastructure::dto::websocket::OutboundMessage,
};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    registry: Arc<RoomRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl DisconnectParticipantUseCase {
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

    /// セッションをアンバインドし、残りの参加者に `user_left` を通知する
    ///
    /// # Returns
    ///
    /// * `Some(UserId)` - アンバインドしたユーザー
    /// * `None` - セッションがバインドされていなかった（ルームが close 済みなど）
    pub async fn execute(&self, room_id: RoomId, session_id: SessionId) -> Option<UserId> {
        self.message_pusher.unregister_client(&session_id).await;

        let (user_id, remaining) = self.registry.leave(room_id, &session_id).await?;

        let now = Timestamp::new(self.clock.now_millis());
        match OutboundMessage::user_left(room_id, user_id, now).encode() {
            Ok(message) => self.message_pusher.broadcast(remaining, &message).await,
            Err(e) => tracing::error!("Failed to encode user_left message: {}", e),
        }

        tracing::info!(
            "User {} left room {} (session {})",
            user_id,
            room_id,
            session_id
        );
        Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryVariableRepository,
    };
    use kokuban_shared::time::FixedClock;
    use tokio::sync::mpsc;

    fn create_test_usecase() -> (
        DisconnectParticipantUseCase,
        Arc<RoomRegistry>,
        Arc<WebSocketMessagePusher>,
    ) {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(2000));
        let registry = Arc::new(RoomRegistry::new(
            Arc::new(InMemoryVariableRepository::new()),
            clock.clone(),
        ));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = DisconnectParticipantUseCase::new(registry.clone(), pusher.clone(), clock);
        (usecase, registry, pusher)
    }

    #[tokio::test]
    async fn test_disconnect_notifies_remaining_participants() {
        // テスト項目: 切断時に残りの参加者へ user_left が通知される
        // given (前提条件):
        let (usecase, registry, pusher) = create_test_usecase();
        let room_id = RoomId::new(1);
        let alice = SessionId::generate();
        let bob = SessionId::generate();
        let (alice_tx, _alice_rx) = mpsc::channel(8);
        let (bob_tx, mut bob_rx) = mpsc::channel(8);
        registry.join(room_id, alice, UserId::new(1)).await.unwrap();
        registry.join(room_id, bob, UserId::new(2)).await.unwrap();
        pusher.register_client(alice, alice_tx).await;
        pusher.register_client(bob, bob_tx).await;

        // when (操作):
        let result = usecase.execute(room_id, alice).await;

        // then (期待する結果):
        assert_eq!(result, Some(UserId::new(1)));
        let message = OutboundMessage::decode(&bob_rx.recv().await.unwrap()).unwrap();
        assert_eq!(
            message,
            OutboundMessage::UserLeft {
                room_id: 1,
                user_id: 1,
                timestamp: 2000,
            }
        );
        assert_eq!(registry.sessions(room_id).await, vec![bob]);
        assert_eq!(pusher.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_last_participant_keeps_room_state() {
        // テスト項目: 最後の参加者が切断してもルームのステートは保持される
        // given (前提条件):
        let (usecase, registry, _pusher) = create_test_usecase();
        let room_id = RoomId::new(1);
        let alice = SessionId::generate();
        registry.join(room_id, alice, UserId::new(1)).await.unwrap();

        // when (操作):
        let result = usecase.execute(room_id, alice).await;

        // then (期待する結果):
        assert_eq!(result, Some(UserId::new(1)));
        assert!(registry.store(room_id).await.is_some());
        assert!(registry.sessions(room_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_unbound_session() {
        // テスト項目: バインドされていないセッションの切断は None を返す
        // given (前提条件):
        let (usecase, _registry, _pusher) = create_test_usecase();

        // when (操作):
        let result = usecase.execute(RoomId::new(1), SessionId::generate()).await;

        // then (期待する結果):
        assert_eq!(result, None);
    }
}
