//! DTO (Data Transfer Objects)
//!
//! プロトコルごとに分ける:
//! - `websocket`: WebSocket メッセージの DTO
//! - `http`: HTTP API レスポンスの DTO

pub mod conversion;
pub mod http;
pub mod websocket;
