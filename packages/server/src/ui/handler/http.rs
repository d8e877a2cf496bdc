//! HTTP API のエンドポイント

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::RoomId,
    infrastructure::dto::http::{
        CloseRoomResponseDto, ParticipantDetailDto, RoomDetailDto, RoomSummaryDto,
        VariableDetailDto,
    },
    ui::state::AppState,
    usecase::{CloseRoomError, GetRoomDetailError, RoomAccessError},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of live rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    let summaries = rooms
        .into_iter()
        .map(|room| RoomSummaryDto {
            room_id: room.room_id.value(),
            participants: room.users().iter().map(|user| user.value()).collect(),
            variable_count: room.variable_count,
        })
        .collect();

    Json(summaries)
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i64>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    match state
        .get_room_detail_usecase
        .execute(RoomId::new(room_id))
        .await
    {
        Ok(room) => {
            let participants: Vec<ParticipantDetailDto> = room
                .members
                .iter()
                .map(|(session_id, user_id)| ParticipantDetailDto {
                    user_id: user_id.value(),
                    session_id: session_id.to_string(),
                })
                .collect();
            Ok(Json(RoomDetailDto {
                room_id: room.room_id.value(),
                participant_count: participants.len(),
                participants,
                variable_count: room.variable_count,
            }))
        }
        Err(GetRoomDetailError::RoomNotFound(_)) => Err(StatusCode::NOT_FOUND),
    }
}

/// Get the variables of a room, ordered by symbol
pub async fn get_room_variables(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i64>,
) -> Result<Json<Vec<VariableDetailDto>>, StatusCode> {
    match state
        .get_room_detail_usecase
        .variables(RoomId::new(room_id))
        .await
    {
        Ok(records) => Ok(Json(
            records.into_iter().map(VariableDetailDto::from).collect(),
        )),
        Err(GetRoomDetailError::RoomNotFound(_)) => Err(StatusCode::NOT_FOUND),
    }
}

/// Close a room: evict its state and notify bound connections
pub async fn close_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i64>,
) -> Result<Json<CloseRoomResponseDto>, StatusCode> {
    match state.close_room_usecase.execute(RoomId::new(room_id)).await {
        Ok(notified_sessions) => Ok(Json(CloseRoomResponseDto {
            room_id,
            notified_sessions,
        })),
        Err(CloseRoomError::Room(RoomAccessError::NotFound(_))) => Err(StatusCode::NOT_FOUND),
        Err(CloseRoomError::Room(RoomAccessError::Closed(_))) => Err(StatusCode::GONE),
        Err(CloseRoomError::Room(RoomAccessError::Unavailable(reason))) => {
            tracing::error!("Failed to close room {}: {}", room_id, reason);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
