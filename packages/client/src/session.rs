//! WebSocket のクライアントセッション管理

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, protocol::Message},
};

use kokuban_server::infrastructure::dto::websocket::{InboundMessage, OutboundMessage};

use crate::error::ClientError;

use super::{
    domain::{Command, LocalVariables, parse_command},
    formatter::MessageFormatter,
    ui::redisplay_prompt,
};

/// Where and as whom to connect
#[derive(Debug, Clone)]
pub struct SessionTarget {
    pub url: String,
    pub room_id: i64,
    pub token: String,
}

impl SessionTarget {
    fn connect_url(&self) -> String {
        format!("{}?room_id={}&token={}", self.url, self.room_id, self.token)
    }

    pub fn prompt(&self) -> String {
        format!("room {}> ", self.room_id)
    }
}

fn handshake_error(target: &SessionTarget, error: WsError) -> ClientError {
    match error {
        WsError::Http(response) => match response.status().as_u16() {
            401 => ClientError::Unauthorized,
            404 => ClientError::RoomNotFound(target.room_id),
            410 => ClientError::RoomClosed(target.room_id),
            status => ClientError::ConnectionError(format!("handshake rejected with HTTP {status}")),
        },
        other => ClientError::ConnectionError(other.to_string()),
    }
}

/// Run one connection until the user quits (`Ok`) or the connection is lost (`Err`).
///
/// `input` outlives the session so that reconnecting does not spawn another readline thread.
pub async fn run_client_session(
    target: &SessionTarget,
    local: &mut LocalVariables,
    input: &mut mpsc::UnboundedReceiver<String>,
    resync: bool,
) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(target.connect_url())
        .await
        .map_err(|e| handshake_error(target, e))?;

    tracing::info!("Connected to room {}", target.room_id);
    println!("\nType /help for commands. Press Ctrl+C to exit.\n");

    let (mut write, mut read) = ws_stream.split();
    let prompt = target.prompt();

    // 再接続時は切断中に取りこぼした更新を取り直す
    if resync {
        send(&mut write, &InboundMessage::SyncRequest).await?;
    }

    loop {
        tokio::select! {
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        print!("{}", handle_server_message(local, text.as_str()));
                        redisplay_prompt(&prompt);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(ClientError::ConnectionError(
                            "Server closed the connection".to_string(),
                        ));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return Err(ClientError::ConnectionError(e.to_string()));
                    }
                }
            }
            line = input.recv() => {
                // stdin が閉じた（Ctrl+C / Ctrl+D）
                let Some(line) = line else {
                    let _ = write.close().await;
                    return Ok(());
                };
                match parse_command(&line) {
                    Ok(Command::Set { symbol, value, unit }) => {
                        let message = local.prepare_update(symbol, value, unit);
                        send(&mut write, &message).await?;
                    }
                    Ok(Command::Sync) => send(&mut write, &InboundMessage::SyncRequest).await?,
                    Ok(Command::Vars) => {
                        let variables: Vec<_> = local.variables().cloned().collect();
                        let title = match local.user_id() {
                            Some(user_id) => format!("Local variables (you are user {user_id})"),
                            None => "Local variables".to_string(),
                        };
                        print!("{}", MessageFormatter::format_variables(&title, &variables));
                    }
                    Ok(Command::Help) => println!("{}", MessageFormatter::format_help()),
                    Ok(Command::Quit) => {
                        let _ = write.close().await;
                        return Ok(());
                    }
                    Err(e) => print!("{}", MessageFormatter::format_error(&e)),
                }
                redisplay_prompt(&prompt);
            }
        }
    }
}

async fn send<S>(write: &mut S, message: &InboundMessage) -> Result<(), ClientError>
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    let json = message
        .encode()
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    write
        .send(Message::text(json))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))
}

/// Apply a server message to the local state and render it.
fn handle_server_message(local: &mut LocalVariables, text: &str) -> String {
    let Ok(message) = OutboundMessage::decode(text) else {
        return MessageFormatter::format_raw_message(text);
    };

    match message {
        OutboundMessage::RoomState {
            room_id,
            user_id,
            variables,
            ..
        } => {
            let output = MessageFormatter::format_variables(
                &format!("Room {room_id} (you are user {user_id})"),
                &variables,
            );
            local.reset(user_id, variables);
            output
        }
        OutboundMessage::SyncResponse {
            user_id, variables, ..
        } => {
            let output = MessageFormatter::format_variables("Synchronized", &variables);
            local.reset(user_id, variables);
            output
        }
        OutboundMessage::VariableUpdate {
            timestamp,
            variable_update,
            ..
        } => {
            let output = MessageFormatter::format_variable_update(&variable_update, timestamp);
            local.observe(variable_update);
            output
        }
        OutboundMessage::UserJoined {
            user_id, timestamp, ..
        } => MessageFormatter::format_user_joined(user_id, timestamp),
        OutboundMessage::UserLeft {
            user_id, timestamp, ..
        } => MessageFormatter::format_user_left(user_id, timestamp),
        OutboundMessage::Error { error, .. } => MessageFormatter::format_error(&error),
    }
}
