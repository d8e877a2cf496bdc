//! サーバーの組み立てと起動

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use kokuban_shared::time::{Clock, SystemClock};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    domain::{
        IdentityResolver, MessagePusher, RoomDirectory, RoomRegistry, UserId,
        VariableRepository,
    },
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryIdentityResolver, InMemoryRoomDirectory, InMemoryVariableRepository},
    },
    usecase::{
        CloseRoomUseCase, ConnectParticipantUseCase, DisconnectParticipantUseCase,
        GetRoomDetailUseCase, GetRoomsUseCase, SyncVariablesUseCase, UpdateVariableUseCase,
    },
};

use super::{
    config::ServerConfig,
    handler::{
        close_room, get_room_detail, get_room_variables, get_rooms, health_check,
        websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// External collaborators injected into the server
pub struct Collaborators {
    pub identity: Arc<dyn IdentityResolver>,
    pub directory: Arc<dyn RoomDirectory>,
    pub variables: Arc<dyn VariableRepository>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// In-memory collaborators seeded from the configuration
    pub fn in_memory(config: &ServerConfig) -> Self {
        Self {
            identity: Arc::new(InMemoryIdentityResolver::with_tokens(
                config.trust_numeric_credentials,
                config
                    .tokens
                    .iter()
                    .map(|(token, user_id)| (token.clone(), UserId::new(*user_id))),
            )),
            directory: Arc::new(InMemoryRoomDirectory::with_active_rooms(config.room_ids())),
            variables: Arc::new(InMemoryVariableRepository::new()),
            clock: Arc::new(SystemClock),
        }
    }
}

/// Shared-variable synchronization server
///
/// ```ignore
/// let config = ServerConfig::default();
/// let server = Server::new(&config, Collaborators::in_memory(&config));
/// server.run().await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    host: String,
    port: u16,
}

impl Server {
    pub fn new(config: &ServerConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            identity,
            directory,
            variables,
            clock,
        } = collaborators;

        // 1. RoomRegistry と MessagePusher
        let registry = Arc::new(RoomRegistry::new(variables, clock.clone()));
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

        // 2. UseCases
        let state = AppState {
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                identity,
                directory.clone(),
                registry.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                registry.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            update_variable_usecase: Arc::new(UpdateVariableUseCase::new(
                directory.clone(),
                registry.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            sync_variables_usecase: Arc::new(SyncVariablesUseCase::new(
                registry.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            close_room_usecase: Arc::new(CloseRoomUseCase::new(
                directory,
                registry.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(registry.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(registry)),
            message_pusher,
            clock,
            idle_timeout: config.idle_timeout(),
            outbound_buffer: config.outbound_buffer.max(1),
        };

        Self {
            state: Arc::new(state),
            host: config.host.clone(),
            port: config.port,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .route("/api/rooms/{room_id}/variables", get(get_room_variables))
            .route("/api/rooms/{room_id}/close", post(close_room))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind to the configured address and serve until a shutdown signal arrives.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&bind_addr).await?;
        self.serve(listener).await
    }

    pub async fn serve(self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        tracing::info!("Kokuban server listening on {}", listener.local_addr()?);
        tracing::info!(
            "Connect to: ws://{}/ws?room_id=<room>&token=<credential>",
            listener.local_addr()?
        );
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
