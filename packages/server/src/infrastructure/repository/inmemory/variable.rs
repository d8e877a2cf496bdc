//! InMemory Variable Repository 実装
//!
//! ドメイン層が定義する VariableRepository trait の具体的な実装。
//! (room_id, symbol) をキーとする HashMap をインメモリ DB として使用します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{RepositoryError, RoomId, Symbol, VariableRecord, VariableRepository};

#[derive(Default)]
pub struct InMemoryVariableRepository {
    records: RwLock<HashMap<(RoomId, Symbol), VariableRecord>>,
}

impl InMemoryVariableRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VariableRepository for InMemoryVariableRepository {
    async fn load_all(&self, room_id: RoomId) -> Result<Vec<VariableRecord>, RepositoryError> {
        let records = self.records.read().await;
        let mut variables: Vec<VariableRecord> = records
            .iter()
            .filter(|((id, _), _)| *id == room_id)
            .map(|(_, record)| record.clone())
            .collect();
        variables.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(variables)
    }

    async fn upsert(&self, record: &VariableRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.insert((record.room_id, record.symbol.clone()), record.clone());
        Ok(())
    }
}
