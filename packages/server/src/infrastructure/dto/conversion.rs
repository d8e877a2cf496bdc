//! DTO とドメインエンティティの相互変換

use kokuban_shared::time::timestamp_to_rfc3339;

use crate::domain::{DEFAULT_SOURCE, Symbol, UserId, VariableRecord, VariableUpdate};
use crate::infrastructure::dto::{
    http::VariableDetailDto,
    websocket::{ProtocolError, VariableDto, VariableUpdatePayload},
};

// ========================================
// DTO → Domain Entity
// ========================================

impl VariableUpdatePayload {
    /// Validate the payload and attach the participant the connection is bound to.
    pub fn into_update(self, updated_by: UserId) -> Result<VariableUpdate, ProtocolError> {
        let symbol = Symbol::new(self.symbol)?;
        let source = self
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());

        Ok(VariableUpdate {
            symbol,
            value: self.value,
            unit: self.unit,
            vector_clock: self.vector_clock,
            source,
            verified: self.verified,
            updated_by,
        })
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<VariableRecord> for VariableDto {
    fn from(record: VariableRecord) -> Self {
        Self {
            symbol: record.symbol.into_string(),
            value: record.value,
            unit: record.unit,
            vector_clock: record.vector_clock,
            updated_by: record.last_updated_by.value(),
            source: record.source,
            verified: record.is_verified,
        }
    }
}

impl From<VariableRecord> for VariableDetailDto {
    fn from(record: VariableRecord) -> Self {
        Self {
            symbol: record.symbol.into_string(),
            value: record.value,
            unit: record.unit,
            precision_digits: record.precision_digits,
            vector_clock: record.vector_clock,
            last_updated_by: record.last_updated_by.value(),
            source: record.source,
            is_verified: record.is_verified,
            created_at: timestamp_to_rfc3339(record.created_at.value()),
            updated_at: timestamp_to_rfc3339(record.updated_at.value()),
        }
    }
}
