//! Kokuban サーバー: 学習ルームの共有変数をベクタークロックで同期する
//!
//! - `domain`: ベクタークロック・変数レコード・競合解決・ルーム単位のステート
//! - `infrastructure`: 通信用 DTO とインメモリの collaborator 実装
//! - `usecase`: 1 操作 1 構造体のユースケース
//! - `ui`: axum のルーターとハンドラ

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
