//! UseCase: 参加者接続処理
//!
//! ハンドシェイク時の認可（`authorize`）と、WebSocket 確立後のバインド（`execute`）の
//! 2 段階に分かれる。認可に失敗した接続はアップグレード前に拒否されるため、
//! 閉じた・存在しないルームのステートが作られることはない。

use std::sync::Arc;

use kokuban_shared::time::Clock;

use crate::{
    domain::{
        IdentityResolver, MessagePusher, PusherChannel, RoomDirectory, RoomId, RoomRegistry,
        SessionId, Timestamp, UserId,
    },
    infrastructure::dto::websocket::OutboundMessage,
};

use super::{
    error::{ConnectError, RoomAccessError},
    room_guard::ensure_room_active,
};

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    identity: Arc<dyn IdentityResolver>,
    directory: Arc<dyn RoomDirectory>,
    registry: Arc<RoomRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    pub fn new(
        identity: Arc<dyn IdentityResolver>,
        directory: Arc<dyn RoomDirectory>,
        registry: Arc<RoomRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            directory,
            registry,
            message_pusher,
            clock,
        }
    }

    /// クレデンシャルからユーザーを解決し、ルームが更新を受け付けるか確認する
    pub async fn authorize(&self, room_id: RoomId, credential: &str) -> Result<UserId, ConnectError> {
        let user_id = self.identity.resolve_identity(credential).await?;
        ensure_room_active(self.directory.as_ref(), room_id).await?;
        Ok(user_id)
    }

    /// セッションを (room, user) にバインドする
    ///
    /// 1. ルームに参加（初回はステートを読み込む）。参加後にルームが Closed なら取り消す
    /// 2. MessagePusher に送信チャンネルを登録
    /// 3. 本人に `room_state` を送信
    /// 4. 他の参加者に `user_joined` をブロードキャスト
    pub async fn execute(
        &self,
        room_id: RoomId,
        user_id: UserId,
        session_id: SessionId,
        sender: PusherChannel,
    ) -> Result<(), ConnectError> {
        ensure_room_active(self.directory.as_ref(), room_id).await?;

        let store = self.registry.join(room_id, session_id, user_id).await?;

        // 確認と join の間に close された場合、閉じたルームのステートを残さない
        if let Err(e) = ensure_room_active(self.directory.as_ref(), room_id).await {
            self.registry.leave(room_id, &session_id).await;
            if matches!(e, RoomAccessError::Closed(_) | RoomAccessError::NotFound(_)) {
                self.registry.evict(room_id).await;
            }
            return Err(e.into());
        }

        self.message_pusher.register_client(session_id, sender).await;

        let now = Timestamp::new(self.clock.now_millis());
        let room_state =
            OutboundMessage::room_state(room_id, user_id, store.snapshot().await, now).encode()?;
        self.message_pusher.push_to(&session_id, &room_state).await?;

        let others: Vec<SessionId> = self
            .registry
            .sessions(room_id)
            .await
            .into_iter()
            .filter(|id| *id != session_id)
            .collect();
        let joined = OutboundMessage::user_joined(room_id, user_id, now).encode()?;
        self.message_pusher.broadcast(others, &joined).await;

        tracing::info!(
            "User {} joined room {} (session {})",
            user_id,
            room_id,
            session_id
        );
        Ok(())
    }
}
