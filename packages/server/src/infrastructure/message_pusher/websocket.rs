//! WebSocket を使った MessagePusher 実装
//!
//! 接続ごとの送信タスクへ有界チャンネル経由でメッセージを渡す。
//! 送信は `try_send` のみで行い、ルームへのブロードキャストが遅い受信者を待つことはない。
//! バッファが溢れたセッションは登録を解除する。sender が drop されると
//! UI 層の送信タスクが終了し、その接続は切断される。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::domain::{MessagePushError, MessagePusher, PusherChannel, SessionId};

type SessionChannels = Arc<Mutex<HashMap<SessionId, PusherChannel>>>;

#[derive(Default)]
pub struct WebSocketMessagePusher {
    sessions: SessionChannels,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// 1 セッションへの非ブロッキング送信。バッファ溢れ・切断済みのセッションはマップから外す。
fn try_push(
    sessions: &mut HashMap<SessionId, PusherChannel>,
    session_id: &SessionId,
    content: &str,
) -> Result<(), MessagePushError> {
    let sender = sessions
        .get(session_id)
        .ok_or(MessagePushError::SessionNotFound(*session_id))?;

    match sender.try_send(content.to_string()) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(_)) => {
            tracing::warn!(
                "Outbound buffer of session {} is full, disconnecting",
                session_id
            );
            sessions.remove(session_id);
            Err(MessagePushError::BufferFull(*session_id))
        }
        Err(TrySendError::Closed(_)) => {
            sessions.remove(session_id);
            Err(MessagePushError::Closed(*session_id))
        }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, session_id: SessionId, sender: PusherChannel) {
        self.sessions.lock().await.insert(session_id, sender);
        tracing::debug!("Session {} registered to MessagePusher", session_id);
    }

    async fn unregister_client(&self, session_id: &SessionId) {
        self.sessions.lock().await.remove(session_id);
        tracing::debug!("Session {} unregistered from MessagePusher", session_id);
    }

    async fn push_to(
        &self,
        session_id: &SessionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let mut sessions = self.sessions.lock().await;
        try_push(&mut sessions, session_id, content)?;
        tracing::debug!("Pushed message to session {}", session_id);
        Ok(())
    }

    async fn broadcast(&self, targets: Vec<SessionId>, content: &str) {
        let mut sessions = self.sessions.lock().await;
        for target in targets {
            // 一部の送信失敗は許容する
            match try_push(&mut sessions, &target, content) {
                Ok(()) => tracing::debug!("Broadcasted message to session {}", target),
                Err(MessagePushError::SessionNotFound(_)) => {
                    tracing::debug!("Session {} not found during broadcast, skipping", target)
                }
                Err(e) => tracing::warn!("Failed to push message to session {}: {}", target, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_push_to_success() {
        // テスト項目: 特定のセッションにメッセージを送信できる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::channel(8);
        let session = SessionId::generate();
        pusher.register_client(session, tx).await;

        // when (操作):
        let result = pusher.push_to(&session, "Hello").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some("Hello".to_string()));
    }

    #[tokio::test]
    async fn test_push_to_session_not_found() {
        // テスト項目: 未登録のセッションへの送信はエラーを返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let session = SessionId::generate();

        // when (操作):
        let result = pusher.push_to(&session, "Hello").await;

        // then (期待する結果):
        assert_eq!(result, Err(MessagePushError::SessionNotFound(session)));
    }

    #[tokio::test]
    async fn test_broadcast_to_multiple_sessions() {
        // テスト項目: 複数のセッションにブロードキャストでき、未登録のセッションは無視される
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        let alice = SessionId::generate();
        let bob = SessionId::generate();
        pusher.register_client(alice, tx1).await;
        pusher.register_client(bob, tx2).await;

        // when (操作):
        pusher
            .broadcast(vec![alice, bob, SessionId::generate()], "update")
            .await;

        // then (期待する結果):
        assert_eq!(rx1.recv().await, Some("update".to_string()));
        assert_eq!(rx2.recv().await, Some("update".to_string()));
    }

    #[tokio::test]
    async fn test_full_buffer_disconnects_only_slow_session() {
        // テスト項目: バッファが溢れたセッションだけが切断され、他のセッションには届き続ける
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (slow_tx, mut slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(8);
        let slow = SessionId::generate();
        let fast = SessionId::generate();
        pusher.register_client(slow, slow_tx).await;
        pusher.register_client(fast, fast_tx).await;

        // when (操作): slow は 1 件も読まない
        pusher.broadcast(vec![slow, fast], "first").await;
        pusher.broadcast(vec![slow, fast], "second").await;

        // then (期待する結果):
        assert_eq!(fast_rx.recv().await, Some("first".to_string()));
        assert_eq!(fast_rx.recv().await, Some("second".to_string()));
        assert_eq!(pusher.session_count().await, 1);
        // sender が drop されたので、溜まっていた 1 件の後にチャンネルが閉じる
        assert_eq!(slow_rx.recv().await, Some("first".to_string()));
        assert_eq!(slow_rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_push_to_closed_session() {
        // テスト項目: 受信側が閉じたセッションへの送信は Closed になり、登録が解除される
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, rx) = mpsc::channel(8);
        let session = SessionId::generate();
        pusher.register_client(session, tx).await;
        drop(rx);

        // when (操作):
        let result = pusher.push_to(&session, "Hello").await;

        // then (期待する結果):
        assert_eq!(result, Err(MessagePushError::Closed(session)));
        assert_eq!(pusher.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_unregister_client() {
        // テスト項目: 登録解除後は送信できない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, _rx) = mpsc::channel(8);
        let session = SessionId::generate();
        pusher.register_client(session, tx).await;

        // when (操作):
        pusher.unregister_client(&session).await;

        // then (期待する結果):
        assert_eq!(
            pusher.push_to(&session, "Hello").await,
            Err(MessagePushError::SessionNotFound(session))
        );
    }
}
