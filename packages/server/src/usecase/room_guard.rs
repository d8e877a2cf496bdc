//! ユースケース共通のルーム状態チェック

use crate::domain::{RoomDirectory, RoomId};

use super::error::RoomAccessError;

/// Closed / unknown rooms never accept updates nor get new state.
pub async fn ensure_room_active(
    directory: &dyn RoomDirectory,
    room_id: RoomId,
) -> Result<(), RoomAccessError> {
    if directory.is_active(room_id).await? {
        Ok(())
    } else {
        Err(RoomAccessError::Closed(room_id))
    }
}
