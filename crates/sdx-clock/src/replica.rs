//! Replica identity.
//!
//! Every member of the grid that can host CRDT state is identified by an
//! opaque, globally unique id. The same id keys the per-replica logical
//! timestamps inside a [`crate::vector_clock::VectorClock`].

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Opaque identity of a replica (a data member of the grid).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReplicaId(Ulid);

impl ReplicaId {
    /// Generate a fresh random replica id.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Wrap an existing ULID.
    pub fn from_ulid(id: Ulid) -> Self {
        Self(id)
    }

    /// The underlying ULID.
    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for ReplicaId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Ulid> for ReplicaId {
    fn from(id: Ulid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replica_id_unique() {
        let a = ReplicaId::new();
        let b = ReplicaId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_replica_id_roundtrip() {
        let id = ReplicaId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: ReplicaId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
