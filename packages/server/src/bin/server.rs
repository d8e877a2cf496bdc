//! Kokuban 共有変数サーバー
//!
//! 実行方法:
//! ```not_rust
//! cargo run --bin kokuban-server
//! cargo run --bin kokuban-server -- --host 0.0.0.0 --port 3000 --room 1,2 --trust-numeric-credentials
//! ```

use clap::Parser;
use kokuban_server::ui::{Collaborators, Server, ServerConfig};
use kokuban_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kokuban-server")]
#[command(about = "Shared-variable synchronization server for study rooms", long_about = None)]
struct Args {
    #[command(flatten)]
    config: ServerConfig,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = args.config;
    tracing::info!(
        "Active rooms: {:?}, idle timeout: {:?}, outbound buffer: {}",
        config.rooms,
        config.idle_timeout(),
        config.outbound_buffer
    );
    if config.trust_numeric_credentials {
        tracing::warn!("Numeric credentials are trusted as user ids");
    }

    let server = Server::new(&config, Collaborators::in_memory(&config));
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
