//! I/O を持たないクライアント側ロジック
//!
//! コマンドのパース、ローカルのベクタークロック、再接続ポリシー。

use std::collections::BTreeMap;

use kokuban_server::{
    domain::VectorClock,
    infrastructure::dto::websocket::{InboundMessage, VariableDto, VariableUpdatePayload},
};

use crate::error::ClientError;

/// Line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/set <symbol> <value> [unit]`
    Set {
        symbol: String,
        value: String,
        unit: Option<String>,
    },
    /// `/sync`
    Sync,
    /// `/vars`
    Vars,
    /// `/help`
    Help,
    /// `/quit`
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err("empty input".to_string());
    };

    match head {
        "/set" => {
            let (Some(symbol), Some(value)) = (parts.next(), parts.next()) else {
                return Err("usage: /set <symbol> <value> [unit]".to_string());
            };
            let unit = parts.next().map(str::to_string);
            if parts.next().is_some() {
                return Err("usage: /set <symbol> <value> [unit]".to_string());
            }
            Ok(Command::Set {
                symbol: symbol.to_string(),
                value: value.to_string(),
                unit,
            })
        }
        "/sync" => Ok(Command::Sync),
        "/vars" => Ok(Command::Vars),
        "/help" => Ok(Command::Help),
        "/quit" | "/exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}' (try /help)")),
    }
}

/// Last known state of the room's variables, as seen by this client
#[derive(Debug, Default)]
pub struct LocalVariables {
    user_id: Option<i64>,
    variables: BTreeMap<String, VariableDto>,
}

impl LocalVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    /// Replace everything with a `room_state` / `sync_response` snapshot.
    pub fn reset(&mut self, user_id: i64, variables: Vec<VariableDto>) {
        self.user_id = Some(user_id);
        self.variables = variables
            .into_iter()
            .map(|variable| (variable.symbol.clone(), variable))
            .collect();
    }

    pub fn observe(&mut self, variable: VariableDto) {
        self.variables.insert(variable.symbol.clone(), variable);
    }

    pub fn variables(&self) -> impl Iterator<Item = &VariableDto> {
        self.variables.values()
    }

    /// Clock for a new local edit: the last known clock of the symbol with
    /// this participant's counter incremented.
    pub fn next_clock(&self, symbol: &str) -> VectorClock {
        let mut clock = self
            .variables
            .get(symbol)
            .map(|variable| variable.vector_clock.clone())
            .unwrap_or_default();
        if let Some(user_id) = self.user_id {
            clock.increment(user_id.to_string());
        }
        clock
    }

    /// Build the `variable_update` message for `/set`.
    ///
    /// The local copy is not touched; the server's broadcast is authoritative.
    pub fn prepare_update(
        &self,
        symbol: String,
        value: String,
        unit: Option<String>,
    ) -> InboundMessage {
        let vector_clock = self.next_clock(&symbol);
        InboundMessage::VariableUpdate {
            variable_update: VariableUpdatePayload {
                symbol,
                value,
                unit,
                vector_clock,
                source: None,
                verified: false,
            },
        }
    }
}

pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::Unauthorized | ClientError::RoomNotFound(_) | ClientError::RoomClosed(_)
    )
}

pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }
    current_attempt < max_attempts
}
