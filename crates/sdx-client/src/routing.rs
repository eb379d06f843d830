//! Sticky replica routing with failover.
//!
//! Each session pins one data member and keeps sending to it while it stays
//! eligible. Sticky routing keeps the observed clock meaningful: hopping
//! between replicas on every call would churn the causal view for no benefit.
//! When the pinned member fails mid-call it is excluded for the remainder of
//! that call and the router fails over to the next eligible member.

use sdx_clock::ReplicaId;
use std::collections::HashSet;
use tracing::debug;

/// Per-call set of replicas excluded after failing.
pub type ExcludedSet = HashSet<ReplicaId>;

/// Chooses the member that receives the next operation.
#[derive(Clone, Debug, Default)]
pub struct ReplicaRouter {
    target: Option<ReplicaId>,
}

impl ReplicaRouter {
    /// Create a router with no pinned target.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently pinned target, if any.
    pub fn target(&self) -> Option<ReplicaId> {
        self.target
    }

    /// Drop the pin so the next selection starts from scratch.
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    /// Pick the member for the next invocation.
    ///
    /// Keeps the pinned target while it is still a listed data member and not
    /// excluded; otherwise pins the first eligible candidate in the view.
    /// Returns `None` when every data member is excluded or the view is
    /// empty.
    pub fn select_target(
        &mut self,
        data_members: &[ReplicaId],
        excluded: &ExcludedSet,
    ) -> Option<ReplicaId> {
        if let Some(pinned) = self.target {
            if !excluded.contains(&pinned) && data_members.contains(&pinned) {
                return Some(pinned);
            }
        }

        let next = data_members
            .iter()
            .copied()
            .find(|member| !excluded.contains(member));
        match next {
            Some(member) => debug!(%member, "pinning replica for session"),
            None => debug!("no eligible data member left to target"),
        }
        self.target = next;
        next
    }

    /// Exclude `member` for the remainder of the current call.
    ///
    /// The persisted pin is left alone; the next `select_target` sees the
    /// exclusion and fails over.
    pub fn exclude_on_failure(&self, member: ReplicaId, excluded: &mut ExcludedSet) {
        debug!(%member, "excluding unreachable replica for this call");
        excluded.insert(member);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replicas(n: usize) -> Vec<ReplicaId> {
        (0..n).map(|_| ReplicaId::new()).collect()
    }

    #[test]
    fn test_pins_first_eligible_member() {
        let members = replicas(3);
        let mut router = ReplicaRouter::new();

        let target = router.select_target(&members, &ExcludedSet::new());
        assert_eq!(target, Some(members[0]));
        assert_eq!(router.target(), Some(members[0]));
    }

    #[test]
    fn test_sticky_across_selections() {
        let members = replicas(3);
        let mut router = ReplicaRouter::new();
        let first = router.select_target(&members, &ExcludedSet::new());

        // Same view, same answer, even if the pinned member is not first.
        let reordered: Vec<_> = members.iter().rev().copied().collect();
        let second = router.select_target(&reordered, &ExcludedSet::new());
        assert_eq!(first, second);
    }

    #[test]
    fn test_fails_over_when_pin_excluded() {
        let members = replicas(3);
        let mut router = ReplicaRouter::new();
        let mut excluded = ExcludedSet::new();

        let first = router.select_target(&members, &excluded).unwrap();
        router.exclude_on_failure(first, &mut excluded);

        let second = router.select_target(&members, &excluded).unwrap();
        assert_ne!(first, second);
        assert_eq!(router.target(), Some(second));
    }

    #[test]
    fn test_fails_over_when_pin_leaves_membership() {
        let members = replicas(3);
        let mut router = ReplicaRouter::new();
        let first = router.select_target(&members, &ExcludedSet::new()).unwrap();

        let shrunk: Vec<_> = members.iter().copied().filter(|m| *m != first).collect();
        let second = router.select_target(&shrunk, &ExcludedSet::new()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_none_when_all_excluded() {
        let members = replicas(2);
        let mut router = ReplicaRouter::new();
        let mut excluded = ExcludedSet::new();
        router.exclude_on_failure(members[0], &mut excluded);
        router.exclude_on_failure(members[1], &mut excluded);

        assert_eq!(router.select_target(&members, &excluded), None);
        assert_eq!(router.target(), None);
    }

    #[test]
    fn test_none_on_empty_view() {
        let mut router = ReplicaRouter::new();
        assert_eq!(router.select_target(&[], &ExcludedSet::new()), None);
    }
}
