//! UseCase: ルームの close 処理
//!
//! ルームを Closed にし、ステートとセッション集合を破棄したうえで、
//! バインドされていた接続に `error`（room closed）を送る。接続自体は閉じない。
//! 以降の `variable_update` / `sync_request` はエラーで応答される。

use std::sync::Arc;

use kokuban_shared::time::Clock;

use crate::{
    domain::{MessagePusher, RoomDirectory, RoomId, RoomRegistry, Timestamp},
    infrastructure::dto::websocket::OutboundMessage,
};

use super::error::{CloseRoomError, RoomAccessError};

pub struct CloseRoomUseCase {
    directory: Arc<dyn RoomDirectory>,
    registry: Arc<RoomRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl CloseRoomUseCase {
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

    /// Close the room and return the number of sessions that were notified.
    pub async fn execute(&self, room_id: RoomId) -> Result<usize, CloseRoomError> {
        self.directory
            .close(room_id)
            .await
            .map_err(RoomAccessError::from)?;

        let members = self.registry.evict(room_id).await;
        let now = Timestamp::new(self.clock.now_millis());
        let reason = RoomAccessError::Closed(room_id).to_string();

        for (session_id, user_id) in &members {
            let message = match OutboundMessage::error(room_id, *user_id, reason.as_str(), now)
                .encode()
            {
                Ok(message) => message,
                Err(e) => {
                    tracing::error!("Failed to encode room closed message: {}", e);
                    continue;
                }
            };
            if let Err(e) = self.message_pusher.push_to(session_id, &message).await {
                tracing::warn!("Failed to notify session {} of room close: {}", session_id, e);
            }
        }

        tracing::info!("Room {} closed ({} sessions notified)", room_id, members.len());
        Ok(members.len())
    }
}
