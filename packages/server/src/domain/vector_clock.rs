//! ベクタークロック
//!
//! 1 変数の因果履歴を参加者ごとのカウンタで表す。存在しないキーは `0` として扱う。
//! キーは参加者 ID の文字列表現で、クライアントが送ってくる形式と同じ。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Causal relation of an incoming (remote) clock to the stored (local) one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockOrdering {
    /// Remote dominates local: the incoming update was made knowing the stored one
    RemoteNewer,
    /// Local dominates remote: the incoming update is stale
    LocalNewer,
    /// Neither dominates, including identical clocks
    Concurrent,
}

impl ClockOrdering {
    /// The same relation seen from the other side
    pub fn reverse(self) -> Self {
        match self {
            ClockOrdering::RemoteNewer => ClockOrdering::LocalNewer,
            ClockOrdering::LocalNewer => ClockOrdering::RemoteNewer,
            ClockOrdering::Concurrent => ClockOrdering::Concurrent,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorClock(BTreeMap<String, u64>);

impl VectorClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter for `participant`, `0` when absent
    pub fn get(&self, participant: &str) -> u64 {
        self.0.get(participant).copied().unwrap_or(0)
    }

    /// Set the counter for `participant`, keeping the larger of old and new.
    pub fn observe(&mut self, participant: impl Into<String>, counter: u64) {
        let entry = self.0.entry(participant.into()).or_insert(0);
        *entry = (*entry).max(counter);
    }

    /// Bump `participant`'s counter by one and return the new value.
    pub fn increment(&mut self, participant: impl Into<String>) -> u64 {
        let entry = self.0.entry(participant.into()).or_insert(0);
        *entry = entry.saturating_add(1);
        *entry
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Compare the stored clock (`self`) against an incoming `remote` clock.
    pub fn compare(&self, remote: &VectorClock) -> ClockOrdering {
        let mut local_greater = false;
        let mut remote_greater = false;

        for key in self.0.keys().chain(remote.0.keys()) {
            let l = self.get(key);
            let r = remote.get(key);
            if l > r {
                local_greater = true;
            } else if r > l {
                remote_greater = true;
            }
        }

        match (local_greater, remote_greater) {
            (false, true) => ClockOrdering::RemoteNewer,
            (true, false) => ClockOrdering::LocalNewer,
            _ => ClockOrdering::Concurrent,
        }
    }

    /// Per-key maximum over the union of both key sets.
    pub fn merge(&self, remote: &VectorClock) -> VectorClock {
        let mut merged = self.clone();
        for (key, counter) in remote.iter() {
            merged.observe(key, counter);
        }
        merged
    }

    /// `true` when no entry of `self` is below the matching entry of `earlier`.
    pub fn dominates_or_equals(&self, earlier: &VectorClock) -> bool {
        earlier.iter().all(|(key, counter)| self.get(key) >= counter)
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for VectorClock {
    fn from_iter<T: IntoIterator<Item = (K, u64)>>(iter: T) -> Self {
        let mut clock = VectorClock::new();
        for (key, counter) in iter {
            clock.observe(key, counter);
        }
        clock
    }
}
