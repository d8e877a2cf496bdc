//! HTTP API レスポンスの DTO

use serde::{Deserialize, Serialize};

use crate::domain::VectorClock;

/// Entry of `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub room_id: i64,
    /// Distinct users bound to the room
    pub participants: Vec<i64>,
    pub variable_count: usize,
}

/// `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub room_id: i64,
    pub participants: Vec<ParticipantDetailDto>,
    pub participant_count: usize,
    pub variable_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDetailDto {
    pub user_id: i64,
    pub session_id: String,
}

/// Entry of `GET /api/rooms/{room_id}/variables`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDetailDto {
    pub symbol: String,
    pub value: String,
    pub unit: Option<String>,
    pub precision_digits: u32,
    pub vector_clock: VectorClock,
    pub last_updated_by: i64,
    pub source: String,
    pub is_verified: bool,
    /// RFC 3339
    pub created_at: String,
    /// RFC 3339
    pub updated_at: String,
}

/// `POST /api/rooms/{room_id}/close`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseRoomResponseDto {
    pub room_id: i64,
    /// Sessions that were bound when the room closed
    pub notified_sessions: usize,
}
