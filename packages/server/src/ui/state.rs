//! ハンドラ間で共有するアプリケーション状態

use std::{sync::Arc, time::Duration};

use kokuban_shared::time::Clock;

use crate::{
    domain::MessagePusher,
    usecase::{
        CloseRoomUseCase, ConnectParticipantUseCase, DisconnectParticipantUseCase,
        GetRoomDetailUseCase, GetRoomsUseCase, SyncVariablesUseCase, UpdateVariableUseCase,
    },
};

pub struct AppState {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// UpdateVariableUseCase（変数更新のユースケース）
    pub update_variable_usecase: Arc<UpdateVariableUseCase>,
    /// SyncVariablesUseCase（変数同期のユースケース）
    pub sync_variables_usecase: Arc<SyncVariablesUseCase>,
    /// CloseRoomUseCase（ルーム close のユースケース）
    pub close_room_usecase: Arc<CloseRoomUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// `error` の返信に使う
    pub message_pusher: Arc<dyn MessagePusher>,
    pub clock: Arc<dyn Clock>,
    pub idle_timeout: Duration,
    pub outbound_buffer: usize,
}
