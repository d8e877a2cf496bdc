//! UI 層: axum のルーター・ハンドラ・サーバーのライフサイクル

pub mod config;
mod handler;
mod server;
mod signal;
pub mod state;

pub use config::ServerConfig;
pub use server::{Collaborators, Server};
