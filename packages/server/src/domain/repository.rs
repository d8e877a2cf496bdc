//! Collaborator trait 定義
//!
//! ドメイン層が外部に要求するインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! - `VariableRepository`: 変数レコードの永続化（ルーム単位の全件読み込みと 1 件 upsert）
//! - `RoomDirectory`: ルームが更新を受け付けるか（Active / Closed）の判定
//! - `IdentityResolver`: 接続時のクレデンシャルからユーザー ID を解決

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::{IdentityError, RepositoryError, RoomId, UserId, VariableRecord};

/// Variable persistence collaborator
///
/// Keyed by (room_id, symbol). Only simple lookups and upserts; no query planning.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VariableRepository: Send + Sync {
    /// 指定ルームの全ての変数を取得
    async fn load_all(&self, room_id: RoomId) -> Result<Vec<VariableRecord>, RepositoryError>;

    /// 変数を 1 件保存（既存なら上書き）
    async fn upsert(&self, record: &VariableRecord) -> Result<(), RepositoryError>;
}

/// Room lifecycle collaborator (`Active → Closed`)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// ルームが存在し、更新を受け付ける状態か
    async fn is_active(&self, room_id: RoomId) -> Result<bool, RepositoryError>;

    /// ルームを Closed にする（終端状態）
    async fn close(&self, room_id: RoomId) -> Result<(), RepositoryError>;
}

/// Connection identity collaborator
///
/// Consumed once at connection setup; identity is never re-validated per message.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// ハンドシェイクのクレデンシャルからユーザー ID を解決
    async fn resolve_identity(&self, credential: &str) -> Result<UserId, IdentityError>;
}
