//! MessagePusher trait 定義
//!
//! 接続中のセッションへメッセージを送る抽象化。
//! 送信は非ブロッキングのベストエフォートで、遅い受信者が他の受信者を止めてはならない。

use async_trait::async_trait;
use tokio::sync::mpsc;

#[cfg(test)]
use mockall::automock;

use super::{MessagePushError, SessionId};

/// Bounded channel feeding one connection's outbound writer task
pub type PusherChannel = mpsc::Sender<String>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// セッションの送信チャンネルを登録
    async fn register_client(&self, session_id: SessionId, sender: PusherChannel);

    /// セッションの送信チャンネルを登録解除（チャンネルが閉じ、書き込みタスクが終了する）
    async fn unregister_client(&self, session_id: &SessionId);

    /// 特定のセッションに送信
    async fn push_to(&self, session_id: &SessionId, content: &str)
    -> Result<(), MessagePushError>;

    /// 複数のセッションに送信
    ///
    /// 一部の送信失敗は許容する。バッファが溢れたセッションは切断される。
    async fn broadcast(&self, targets: Vec<SessionId>, content: &str);
}
