//! エンティティ
//!
//! - `VariableRecord`: ルーム内の 1 変数の現在値・ベクタークロック・由来情報
//! - `VariableUpdate`: クライアントから届いた更新要求
//! - `Resolution`: 競合解決の結果

use serde::{Deserialize, Serialize};

use super::{
    value_object::{RoomId, Symbol, Timestamp, UserId},
    vector_clock::VectorClock,
};

/// Default number of significant digits shown for a variable
pub const DEFAULT_PRECISION_DIGITS: u32 = 6;

/// Default provenance tag of an update
pub const DEFAULT_SOURCE: &str = "user";

/// Authoritative state of one symbol within a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRecord {
    pub room_id: RoomId,
    pub symbol: Symbol,
    /// Opaque value; numeric interpretation belongs to the clients
    pub value: String,
    pub unit: Option<String>,
    pub precision_digits: u32,
    pub vector_clock: VectorClock,
    pub last_updated_by: UserId,
    pub source: String,
    pub is_verified: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl VariableRecord {
    /// First record of a previously unseen symbol, built from the incoming update.
    pub fn create(room_id: RoomId, update: VariableUpdate, now: Timestamp) -> Self {
        Self {
            room_id,
            symbol: update.symbol,
            value: update.value,
            unit: update.unit,
            precision_digits: DEFAULT_PRECISION_DIGITS,
            vector_clock: update.vector_clock,
            last_updated_by: update.updated_by,
            source: update.source,
            is_verified: update.verified,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An update pushed by a participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableUpdate {
    pub symbol: Symbol,
    pub value: String,
    pub unit: Option<String>,
    pub vector_clock: VectorClock,
    pub source: String,
    pub verified: bool,
    /// Participant the connection is bound to (never taken from the payload)
    pub updated_by: UserId,
}

/// Outcome of applying an update to the stored record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Symbol was unseen; record created from the update
    Created(VariableRecord),
    /// Incoming clock dominated; update accepted wholesale
    Accepted(VariableRecord),
    /// Clocks were concurrent; last writer won and clocks were merged
    Merged(VariableRecord),
    /// Stored clock dominated; record left unchanged
    Stale(VariableRecord),
}

impl Resolution {
    /// The record as it stands after resolution
    pub fn record(&self) -> &VariableRecord {
        match self {
            Resolution::Created(record)
            | Resolution::Accepted(record)
            | Resolution::Merged(record)
            | Resolution::Stale(record) => record,
        }
    }

    pub fn into_record(self) -> VariableRecord {
        match self {
            Resolution::Created(record)
            | Resolution::Accepted(record)
            | Resolution::Merged(record)
            | Resolution::Stale(record) => record,
        }
    }

    /// Whether the shared state changed and must be broadcast
    pub fn is_state_change(&self) -> bool {
        !matches!(self, Resolution::Stale(_))
    }
}
