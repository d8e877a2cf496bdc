//! ユースケース層のエラー
//!
//! ユースケースごとにエラー型を定義し、UI 層で HTTP ステータスや
//! クライアントへの `error` メッセージに変換する。

use thiserror::Error;

use crate::{
    domain::{IdentityError, MessagePushError, RepositoryError, RoomId, StoreError},
    infrastructure::dto::websocket::ProtocolError,
};

/// Room lifecycle check failures shared by the use cases
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomAccessError {
    #[error("Room {0} not found")]
    NotFound(RoomId),

    #[error("Room {0} is closed")]
    Closed(RoomId),

    #[error("room directory unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for RoomAccessError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::RoomNotFound(room_id) => Self::NotFound(room_id),
            RepositoryError::Unavailable(reason) => Self::Unavailable(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] IdentityError),

    #[error(transparent)]
    Room(#[from] RoomAccessError),

    #[error("failed to load room state: {0}")]
    Store(#[from] StoreError),

    #[error("failed to push room state: {0}")]
    Push(#[from] MessagePushError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateVariableError {
    #[error(transparent)]
    Room(#[from] RoomAccessError),

    #[error(transparent)]
    InvalidPayload(#[from] ProtocolError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Room(#[from] RoomAccessError),

    #[error("failed to push sync response: {0}")]
    Push(#[from] MessagePushError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloseRoomError {
    #[error(transparent)]
    Room(#[from] RoomAccessError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    /// Room has no live state (never joined since startup, or closed)
    #[error("room {0} is not live")]
    RoomNotFound(RoomId),
}
