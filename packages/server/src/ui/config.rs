//! サーバー設定
//!
//! コマンドライン引数と `KOKUBAN_*` 環境変数から読み込む。

use std::time::Duration;

use clap::Args;

use crate::domain::RoomId;

/// Runtime configuration of the server
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "KOKUBAN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "KOKUBAN_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds without any inbound frame before a connection is closed
    #[arg(
        long,
        env = "KOKUBAN_IDLE_TIMEOUT_SECS",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub idle_timeout_secs: u64,

    /// Outbound messages buffered per connection before it is dropped
    #[arg(long, env = "KOKUBAN_OUTBOUND_BUFFER", default_value_t = 64)]
    pub outbound_buffer: usize,

    /// Room ids registered as active at startup (comma separated)
    #[arg(
        long = "room",
        env = "KOKUBAN_ROOMS",
        value_delimiter = ',',
        default_value = "1"
    )]
    pub rooms: Vec<i64>,

    /// Issued credentials as `token:user_id` pairs (comma separated)
    #[arg(
        long = "token",
        env = "KOKUBAN_TOKENS",
        value_delimiter = ',',
        value_parser = parse_token_entry
    )]
    pub tokens: Vec<(String, i64)>,

    /// Accept numeric credentials as user ids (development only)
    #[arg(long, env = "KOKUBAN_TRUST_NUMERIC_CREDENTIALS")]
    pub trust_numeric_credentials: bool,
}

fn parse_token_entry(entry: &str) -> Result<(String, i64), String> {
    let (token, user_id) = entry
        .rsplit_once(':')
        .ok_or_else(|| format!("expected <token>:<user_id>, got '{entry}'"))?;
    if token.is_empty() {
        return Err("token must not be empty".to_string());
    }
    let user_id = user_id
        .parse::<i64>()
        .map_err(|e| format!("invalid user id '{user_id}': {e}"))?;
    Ok((token.to_string(), user_id))
}

impl ServerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.iter().copied().map(RoomId::new).collect()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            idle_timeout_secs: 300,
            outbound_buffer: 64,
            rooms: vec![1],
            tokens: Vec::new(),
            trust_numeric_credentials: false,
        }
    }
}
