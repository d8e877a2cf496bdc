//! クライアントのエラー

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Handshake credential rejected (HTTP 401)
    #[error("credential rejected by the server")]
    Unauthorized,

    /// Room unknown to the server (HTTP 404)
    #[error("room {0} not found")]
    RoomNotFound(i64),

    /// Room closed (HTTP 410)
    #[error("room {0} is closed")]
    RoomClosed(i64),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}
