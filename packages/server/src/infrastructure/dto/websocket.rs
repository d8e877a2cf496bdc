//! WebSocket メッセージの DTO
//!
//! フレームは全て `type` で判別される JSON オブジェクト。フィールド名はワイヤ上では
//! camelCase（`roomId`, `userId`, `variableUpdate`, `vectorClock`, ...）。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{RoomId, Timestamp, UserId, ValueObjectError, VariableRecord, VectorClock};

/// Wire protocol errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Not JSON, unknown `type`, missing field or wrongly typed field
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("invalid symbol: {0}")]
    InvalidSymbol(#[from] ValueObjectError),

    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// Variable payload sent by clients in `variable_update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableUpdatePayload {
    pub symbol: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub vector_clock: VectorClock,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

/// Resolved variable as sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDto {
    pub symbol: String,
    pub value: String,
    pub unit: Option<String>,
    pub vector_clock: VectorClock,
    pub updated_by: i64,
    pub source: String,
    pub verified: bool,
}

/// Client → server messages
///
/// `roomId`/`userId` sent by clients are ignored: the connection's binding is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum InboundMessage {
    VariableUpdate {
        variable_update: VariableUpdatePayload,
    },
    SyncRequest,
}

impl InboundMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

/// Server → client messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboundMessage {
    /// Resolved record after an accepted or merged update (sent to the whole room)
    VariableUpdate {
        room_id: i64,
        user_id: i64,
        timestamp: i64,
        variable_update: VariableDto,
    },
    /// Reply to `sync_request` (requester only)
    SyncResponse {
        room_id: i64,
        user_id: i64,
        timestamp: i64,
        variables: Vec<VariableDto>,
    },
    /// Snapshot pushed right after the connection is bound
    RoomState {
        room_id: i64,
        user_id: i64,
        timestamp: i64,
        variables: Vec<VariableDto>,
    },
    UserJoined {
        room_id: i64,
        user_id: i64,
        timestamp: i64,
    },
    UserLeft {
        room_id: i64,
        user_id: i64,
        timestamp: i64,
    },
    Error {
        room_id: i64,
        user_id: i64,
        timestamp: i64,
        error: String,
    },
}

impl OutboundMessage {
    pub fn variable_update(
        room_id: RoomId,
        updated_by: UserId,
        record: VariableRecord,
        timestamp: Timestamp,
    ) -> Self {
        Self::VariableUpdate {
            room_id: room_id.value(),
            user_id: updated_by.value(),
            timestamp: timestamp.value(),
            variable_update: record.into(),
        }
    }

    pub fn sync_response(
        room_id: RoomId,
        requester: UserId,
        records: Vec<VariableRecord>,
        timestamp: Timestamp,
    ) -> Self {
        Self::SyncResponse {
            room_id: room_id.value(),
            user_id: requester.value(),
            timestamp: timestamp.value(),
            variables: records.into_iter().map(VariableDto::from).collect(),
        }
    }

    pub fn room_state(
        room_id: RoomId,
        user_id: UserId,
        records: Vec<VariableRecord>,
        timestamp: Timestamp,
    ) -> Self {
        Self::RoomState {
            room_id: room_id.value(),
            user_id: user_id.value(),
            timestamp: timestamp.value(),
            variables: records.into_iter().map(VariableDto::from).collect(),
        }
    }

    pub fn user_joined(room_id: RoomId, user_id: UserId, timestamp: Timestamp) -> Self {
        Self::UserJoined {
            room_id: room_id.value(),
            user_id: user_id.value(),
            timestamp: timestamp.value(),
        }
    }

    pub fn user_left(room_id: RoomId, user_id: UserId, timestamp: Timestamp) -> Self {
        Self::UserLeft {
            room_id: room_id.value(),
            user_id: user_id.value(),
            timestamp: timestamp.value(),
        }
    }

    pub fn error(
        room_id: RoomId,
        user_id: UserId,
        error: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self::Error {
            room_id: room_id.value(),
            user_id: user_id.value(),
            timestamp: timestamp.value(),
            error: error.into(),
        }
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}
