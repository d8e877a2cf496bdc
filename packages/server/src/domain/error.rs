//! ドメイン層のエラー

use thiserror::Error;

use super::value_object::{RoomId, SessionId};

/// Validation errors raised while constructing value objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("symbol is too long ({length} characters, max {max})")]
    SymbolTooLong { length: usize, max: usize },
}

/// Errors reported by the variable persistence and room directory collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while pushing messages to connections
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("outbound buffer of session {0} is full")]
    BufferFull(SessionId),

    #[error("session {0} is closed")]
    Closed(SessionId),
}

/// Handshake credential rejected by the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("missing credential")]
    MissingCredential,

    #[error("unknown credential")]
    UnknownCredential,
}

/// Room state store failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("failed to persist variable: {0}")]
    Persistence(#[from] RepositoryError),

    #[error("update task interrupted: {0}")]
    Interrupted(String),
}
