//! 並行な変数更新の競合解決
//!
//! (保存済みレコード, 受信した更新) に対する純粋関数。ルーム単位の直列化は
//! 呼び出し側（`RoomStateStore`）の責務。
//!
//! ## 既知の制約
//!
//! 真に並行な書き込みでは最後に届いた値が勝ち、もう一方の値は失われる（クロックは merge される）。
//! フィールド単位・数値的なマージは行わない。

use super::{
    entity::{Resolution, VariableRecord, VariableUpdate},
    value_object::{RoomId, Timestamp},
    vector_clock::ClockOrdering,
};

/// Decide how `incoming` affects `existing` (or create the record when absent).
pub fn resolve(
    room_id: RoomId,
    existing: Option<VariableRecord>,
    incoming: VariableUpdate,
    now: Timestamp,
) -> Resolution {
    let Some(existing) = existing else {
        tracing::debug!(
            "Variable '{}' created in room {} by user {}",
            incoming.symbol,
            room_id,
            incoming.updated_by
        );
        return Resolution::Created(VariableRecord::create(room_id, incoming, now));
    };

    match existing.vector_clock.compare(&incoming.vector_clock) {
        ClockOrdering::RemoteNewer => {
            tracing::debug!(
                "Variable '{}' updated in room {} (incoming newer)",
                existing.symbol,
                room_id
            );
            Resolution::Accepted(overwrite(existing, incoming, now))
        }
        ClockOrdering::Concurrent => {
            tracing::warn!(
                "Conflict detected for variable '{}' in room {}; last writer (user {}) wins",
                existing.symbol,
                room_id,
                incoming.updated_by
            );
            Resolution::Merged(overwrite(existing, incoming, now))
        }
        ClockOrdering::LocalNewer => {
            tracing::debug!(
                "Stale update from user {} rejected for variable '{}' in room {}",
                incoming.updated_by,
                existing.symbol,
                room_id
            );
            Resolution::Stale(existing)
        }
    }
}

/// Take every user-facing field from `incoming`, merge clocks, keep creation metadata.
fn overwrite(existing: VariableRecord, incoming: VariableUpdate, now: Timestamp) -> VariableRecord {
    VariableRecord {
        vector_clock: existing.vector_clock.merge(&incoming.vector_clock),
        value: incoming.value,
        unit: incoming.unit,
        source: incoming.source,
        is_verified: incoming.verified,
        last_updated_by: incoming.updated_by,
        updated_at: now,
        ..existing
    }
}
