//! ユースケース層
//!
//! 1 操作 1 構造体。collaborator は `Arc<dyn Trait>` で注入する。

pub mod close_room;
pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod get_room_detail;
pub mod get_rooms;
pub mod room_guard;
pub mod sync_variables;
pub mod update_variable;

pub use close_room::CloseRoomUseCase;
pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{
    CloseRoomError, ConnectError, GetRoomDetailError, RoomAccessError, SyncError,
    UpdateVariableError,
};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::{GetRoomsUseCase, RoomOverview};
pub use sync_variables::SyncVariablesUseCase;
pub use update_variable::UpdateVariableUseCase;
