//! Cluster membership views.
//!
//! The counter client never discovers membership itself; it consumes a
//! [`MembershipView`] maintained by the surrounding grid infrastructure. Only
//! data members appear in the view: lite members cannot host CRDT state and
//! are never eligible routing targets.

use parking_lot::RwLock;
use sdx_clock::ReplicaId;

/// A view of the members currently able to host CRDT state.
pub trait MembershipView: Send + Sync + 'static {
    /// The data members currently known to the cluster, in a stable order.
    ///
    /// Listed members may still turn out to be unreachable when invoked; the
    /// view only promises they are part of the membership, promptly enough
    /// for routing to make progress.
    fn current_data_members(&self) -> Vec<ReplicaId>;
}

/// In-memory membership view for testing and simulation.
#[derive(Default)]
pub struct MemoryMembership {
    members: RwLock<Vec<ReplicaId>>,
}

impl MemoryMembership {
    /// Create an empty membership view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a view over a fixed member list.
    pub fn with_members(members: impl IntoIterator<Item = ReplicaId>) -> Self {
        Self {
            members: RwLock::new(members.into_iter().collect()),
        }
    }

    /// Add a data member to the view.
    pub fn add_member(&self, member: ReplicaId) {
        let mut members = self.members.write();
        if !members.contains(&member) {
            members.push(member);
        }
    }

    /// Remove a member from the view.
    pub fn remove_member(&self, member: &ReplicaId) {
        self.members.write().retain(|m| m != member);
    }
}

impl MembershipView for MemoryMembership {
    fn current_data_members(&self) -> Vec<ReplicaId> {
        self.members.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_membership_add_remove() {
        let view = MemoryMembership::new();
        assert!(view.current_data_members().is_empty());

        let a = ReplicaId::new();
        let b = ReplicaId::new();
        view.add_member(a);
        view.add_member(b);
        view.add_member(a); // duplicate is a no-op
        assert_eq!(view.current_data_members(), vec![a, b]);

        view.remove_member(&a);
        assert_eq!(view.current_data_members(), vec![b]);
    }
}
