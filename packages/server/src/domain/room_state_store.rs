//! ルーム単位の変数ステート
//!
//! ライブなルームごとに `RoomStateStore` を 1 つ持つ。read-modify-write は全てルームの
//! async mutex を通るため、同じルームへの更新は直列化され、別のルーム同士は競合しない。
//! スナップショットも同じロックを取るので、適用途中の更新は見えない。
//!
//! 確定した結果の通知（`on_commit`）もロックを持ったまま実行する。
//! これにより、確定の順序と配信の順序が常に一致する。

use std::{collections::BTreeMap, future::Future, sync::Arc};

use kokuban_shared::time::Clock;
use tokio::sync::Mutex;

use super::{
    Resolution, RoomId, StoreError, Symbol, Timestamp, VariableRecord, VariableRepository,
    VariableUpdate, conflict_resolver,
};

pub struct RoomStateStore {
    room_id: RoomId,
    variables: Mutex<BTreeMap<Symbol, VariableRecord>>,
    repository: Arc<dyn VariableRepository>,
    clock: Arc<dyn Clock>,
}

impl RoomStateStore {
    /// Hydrate the room's state from the persistence collaborator.
    pub async fn load(
        room_id: RoomId,
        repository: Arc<dyn VariableRepository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let records = repository.load_all(room_id).await?;
        tracing::debug!("Loaded {} variables for room {}", records.len(), room_id);

        let variables = records
            .into_iter()
            .map(|record| (record.symbol.clone(), record))
            .collect();

        Ok(Self {
            room_id,
            variables: Mutex::new(variables),
            repository,
            clock,
        })
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// All variables of the room, ordered by symbol
    pub async fn snapshot(&self) -> Vec<VariableRecord> {
        let variables = self.variables.lock().await;
        variables.values().cloned().collect()
    }

    pub async fn variable_count(&self) -> usize {
        self.variables.lock().await.len()
    }

    /// Resolve `update` against the stored record, persist and commit the outcome.
    ///
    /// When the state changed, `on_commit` receives the committed resolution while
    /// the room lock is still held, so notifications leave in commit order.
    /// Runs on its own task: once started it completes even if the calling
    /// connection goes away.
    pub async fn apply_update<F, Fut>(
        self: &Arc<Self>,
        update: VariableUpdate,
        on_commit: F,
    ) -> Result<Resolution, StoreError>
    where
        F: FnOnce(Resolution) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let store = Arc::clone(self);
        tokio::spawn(async move { store.apply_locked(update, on_commit).await })
            .await
            .map_err(|e| StoreError::Interrupted(e.to_string()))?
    }

    async fn apply_locked<F, Fut>(
        &self,
        update: VariableUpdate,
        on_commit: F,
    ) -> Result<Resolution, StoreError>
    where
        F: FnOnce(Resolution) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut variables = self.variables.lock().await;

        let existing = variables.get(&update.symbol).cloned();
        let now = Timestamp::new(self.clock.now_millis());
        let resolution = conflict_resolver::resolve(self.room_id, existing, update, now);

        if resolution.is_state_change() {
            // 永続化に成功した場合のみメモリ上の状態を更新する
            let record = resolution.record();
            self.repository.upsert(record).await?;
            variables.insert(record.symbol.clone(), record.clone());

            // ロックを保持したまま通知する
            on_commit(resolution.clone()).await;
        }

        Ok(resolution)
    }
}
