//! Vector clock snapshots for session consistency.
//!
//! A [`VectorClock`] records the highest logical timestamp a client has
//! observed from each replica. Clocks are immutable snapshots: the client
//! never merges two clocks entry by entry, it only ever replaces one whole
//! snapshot with another that dominates it. This keeps the stored clock equal
//! to something a single server response actually contained, rather than a
//! composite of timestamps that were never jointly observed.

use crate::replica::ReplicaId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An immutable snapshot of per-replica logical timestamps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock {
    /// Map from replica id to the highest timestamp observed from it.
    entries: BTreeMap<ReplicaId, u64>,
}

impl VectorClock {
    /// Create an empty clock (no causal history).
    pub fn new() -> Self {
        VectorClock {
            entries: BTreeMap::new(),
        }
    }

    /// Create a clock from `(replica, timestamp)` entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (ReplicaId, u64)>) -> Self {
        VectorClock {
            entries: entries.into_iter().collect(),
        }
    }

    /// Get the timestamp observed from a replica, or `None` if this clock has
    /// never observed that replica. A missing entry means "unknown", not zero.
    pub fn get(&self, replica_id: &ReplicaId) -> Option<u64> {
        self.entries.get(replica_id).copied()
    }

    /// Check whether this clock is at least as new as everything `other` has
    /// seen: for every entry `(r, ts)` present in `other`, this clock must
    /// hold an entry for `r` with a timestamp `>= ts`.
    ///
    /// Entries present in `self` but absent from `other` do not affect the
    /// result, and an empty `other` always yields `true`. The check is
    /// deliberately one-directional: it answers the single question "is it
    /// safe to adopt this snapshot over that one", not a full
    /// dominates/dominated/concurrent classification.
    pub fn is_after(&self, other: &VectorClock) -> bool {
        for (replica_id, &ts) in &other.entries {
            match self.get(replica_id) {
                Some(local) if local >= ts => {}
                _ => return false,
            }
        }
        true
    }

    /// Iterate over all `(replica, timestamp)` entries, order unspecified.
    pub fn entries(&self) -> impl Iterator<Item = (&ReplicaId, &u64)> {
        self.entries.iter()
    }

    /// Convert to a list of entries.
    pub fn to_entries(&self) -> Vec<(ReplicaId, u64)> {
        self.entries.iter().map(|(r, &ts)| (*r, ts)).collect()
    }

    /// Number of replicas this clock has observed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether this clock carries no history at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
