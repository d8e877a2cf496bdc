//! WebSocket 接続のハンドラ
//!
//! `GET /ws?room_id=<id>&token=<credential>`
//!
//! 認可はアップグレード前に行い、失敗した場合は HTTP ステータスで拒否する。
//! 確立後は 1 接続につき受信タスクと送信タスクを 1 つずつ持ち、
//! 受信したメッセージは 1 件ずつ処理を完了してから次を読む。

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{Resolution, RoomId, SessionId, Timestamp, UserId},
    infrastructure::dto::websocket::{InboundMessage, OutboundMessage},
    ui::state::AppState,
    usecase::{ConnectError, RoomAccessError},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub room_id: i64,
    #[serde(default)]
    pub token: String,
}

/// Identity of one bound connection
#[derive(Debug, Clone, Copy)]
struct Binding {
    room_id: RoomId,
    user_id: UserId,
    session_id: SessionId,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let room_id = RoomId::new(query.room_id);

    let user_id = match state
        .connect_participant_usecase
        .authorize(room_id, &query.token)
        .await
    {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::warn!("Rejected connection to room {}: {}", room_id, e);
            return Err(connect_error_status(&e));
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, room_id, user_id)))
}

fn connect_error_status(error: &ConnectError) -> StatusCode {
    match error {
        ConnectError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ConnectError::Room(RoomAccessError::NotFound(_)) => StatusCode::NOT_FOUND,
        ConnectError::Room(RoomAccessError::Closed(_)) => StatusCode::GONE,
        ConnectError::Room(RoomAccessError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        ConnectError::Store(_) | ConnectError::Push(_) | ConnectError::Protocol(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Forwards messages queued for this connection to the WebSocket sink.
///
/// The loop ends when the channel closes (unregistered or dropped for backpressure)
/// or the socket can no longer be written.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    })
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, room_id: RoomId, user_id: UserId) {
    let binding = Binding {
        room_id,
        user_id,
        session_id: SessionId::generate(),
    };

    let (tx, rx) = mpsc::channel(state.outbound_buffer);
    if let Err(e) = state
        .connect_participant_usecase
        .execute(room_id, user_id, binding.session_id, tx)
        .await
    {
        tracing::error!(
            "Failed to bind session {} to room {}: {}",
            binding.session_id,
            room_id,
            e
        );
        if let Ok(message) = error_message(&state, &binding, e.to_string()).encode() {
            let _ = socket.send(Message::Text(message.into())).await;
        }
        state
            .disconnect_participant_usecase
            .execute(room_id, binding.session_id)
            .await;
        return;
    }

    let (sender, receiver) = socket.split();

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(receive_loop(receiver, recv_state, binding));
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state
        .disconnect_participant_usecase
        .execute(room_id, binding.session_id)
        .await;
    tracing::info!("Session {} closed", binding.session_id);
}

async fn receive_loop(mut receiver: SplitStream<WebSocket>, state: Arc<AppState>, binding: Binding) {
    loop {
        let next = match tokio::time::timeout(state.idle_timeout, receiver.next()).await {
            Ok(next) => next,
            Err(_) => {
                tracing::info!(
                    "Session {} idle for {:?}, closing",
                    binding.session_id,
                    state.idle_timeout
                );
                break;
            }
        };

        let msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::debug!("WebSocket error on session {}: {}", binding.session_id, e);
                break;
            }
            None => break,
        };

        match msg {
            Message::Text(text) => handle_text(&state, &binding, text.as_str()).await,
            Message::Binary(_) => {
                reply_error(&state, &binding, "binary frames are not supported".to_string())
                    .await
            }
            Message::Close(_) => {
                tracing::debug!("Session {} requested close", binding.session_id);
                break;
            }
            // Ping/pong is handled by the WebSocket protocol
            _ => {}
        }
    }
}

async fn handle_text(state: &AppState, binding: &Binding, text: &str) {
    let message = match InboundMessage::decode(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!("Malformed message from session {}: {}", binding.session_id, e);
            reply_error(state, binding, e.to_string()).await;
            return;
        }
    };

    match message {
        InboundMessage::VariableUpdate { variable_update } => {
            match state
                .update_variable_usecase
                .execute(binding.room_id, binding.user_id, variable_update)
                .await
            {
                Ok(Resolution::Stale(record)) => tracing::debug!(
                    "Dropped stale update of '{}' from user {}",
                    record.symbol,
                    binding.user_id
                ),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        "Update from user {} in room {} refused: {}",
                        binding.user_id,
                        binding.room_id,
                        e
                    );
                    reply_error(state, binding, e.to_string()).await;
                }
            }
        }
        InboundMessage::SyncRequest => {
            if let Err(e) = state
                .sync_variables_usecase
                .execute(binding.room_id, binding.user_id, binding.session_id)
                .await
            {
                tracing::warn!("Sync for session {} failed: {}", binding.session_id, e);
                reply_error(state, binding, e.to_string()).await;
            }
        }
    }
}

fn error_message(state: &AppState, binding: &Binding, error: String) -> OutboundMessage {
    let now = Timestamp::new(state.clock.now_millis());
    OutboundMessage::error(binding.room_id, binding.user_id, error, now)
}

/// Sends an `error` to the originating connection only.
async fn reply_error(state: &AppState, binding: &Binding, error: String) {
    let message = match error_message(state, binding, error).encode() {
        Ok(message) => message,
        Err(e) => {
            tracing::error!("Failed to encode error message: {}", e);
            return;
        }
    };
    if let Err(e) = state
        .message_pusher
        .push_to(&binding.session_id, &message)
        .await
    {
        tracing::warn!("Failed to reply to session {}: {}", binding.session_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IdentityError, StoreError};

    #[test]
    fn test_connect_error_status() {
        // テスト項目: ハンドシェイク時のエラーが適切な HTTP ステータスに変換される
        // given (前提条件):
        let room_id = RoomId::new(1);
        let cases = [
            (
                ConnectError::Unauthorized(IdentityError::MissingCredential),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ConnectError::Room(RoomAccessError::NotFound(room_id)),
                StatusCode::NOT_FOUND,
            ),
            (
                ConnectError::Room(RoomAccessError::Closed(room_id)),
                StatusCode::GONE,
            ),
            (
                ConnectError::Room(RoomAccessError::Unavailable("down".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ConnectError::Store(StoreError::Interrupted("panic".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        // when (操作) / then (期待する結果):
        for (error, expected) in cases {
            assert_eq!(connect_error_status(&error), expected, "{error}");
        }
    }
}
