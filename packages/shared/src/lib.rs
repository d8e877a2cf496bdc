//! Kokuban のサーバー・クライアント共通ユーティリティ

pub mod logger;
pub mod time;
