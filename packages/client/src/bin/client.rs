//! Kokuban 学習ルームのターミナルクライアント
//!
//! ルームに参加し、共有変数の変化を表示しつつ `/set <symbol> <value> [unit]` で編集する。
//! 切断時は自動で再接続し（最大 5 回、5 秒間隔）、再接続後に同期し直す。
//!
//! 実行方法:
//! ```not_rust
//! cargo run --bin kokuban-client -- --room-id 1 --token 42
//! ```

use clap::Parser;
use kokuban_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kokuban-client")]
#[command(about = "Terminal client for shared study-room variables", long_about = None)]
struct Args {
    /// Room to join
    #[arg(short = 'r', long, env = "KOKUBAN_ROOM_ID")]
    room_id: i64,

    /// Handshake credential
    #[arg(short = 't', long, env = "KOKUBAN_TOKEN")]
    token: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, env = "KOKUBAN_URL", default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = kokuban_client::run_client(args.url, args.room_id, args.token).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
