//! リクエストハンドラ

pub mod http;
pub mod websocket;

pub use http::{close_room, get_room_detail, get_room_variables, get_rooms, health_check};
pub use websocket::websocket_handler;
