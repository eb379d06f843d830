//! In-memory data grid for testing and simulation.
//!
//! [`MemoryGrid`] stands in for a whole cluster: it implements both
//! [`MembershipView`] and [`CounterInvoker`] against a single-process state
//! table, with fault injection for the failure kinds the client has to
//! handle. Replication is instantaneous (every data member serves the same
//! authoritative counter state), which is exactly the external contract the
//! client assumes: an already-consistent server-side authority.
//!
//! Each invocation at member `m` bumps `m`'s entry in the counter's replica
//! timestamps, and the response carries the full timestamp snapshot, the same
//! shape a real replica would report.

use crate::invoke::{CounterInvoker, CounterResponse, InvokeFailure};
use crate::membership::MembershipView;
use async_trait::async_trait;
use parking_lot::RwLock;
use sdx_clock::{ReplicaId, VectorClock};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// One simulated cluster member.
#[derive(Clone, Debug)]
struct MemberRecord {
    id: ReplicaId,
    /// Lite members cannot host CRDT state.
    data_member: bool,
    /// Listed in membership but refusing connections.
    reachable: bool,
}

/// Authoritative state of one counter.
#[derive(Clone, Debug, Default)]
struct CounterState {
    value: i64,
    timestamps: BTreeMap<ReplicaId, u64>,
}

impl CounterState {
    fn clock(&self) -> VectorClock {
        VectorClock::from_entries(self.timestamps.iter().map(|(r, &ts)| (*r, ts)))
    }
}

#[derive(Default)]
struct GridState {
    members: Vec<MemberRecord>,
    counters: HashMap<String, CounterState>,
}

/// A single-process simulation of the data grid.
#[derive(Default)]
pub struct MemoryGrid {
    state: RwLock<GridState>,
}

impl MemoryGrid {
    /// Create an empty grid with no members.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a grid with `n` data members.
    pub fn with_data_members(n: usize) -> Self {
        let grid = Self::new();
        for _ in 0..n {
            grid.add_data_member();
        }
        grid
    }

    /// Add a member capable of hosting CRDT state.
    pub fn add_data_member(&self) -> ReplicaId {
        self.add_member(true)
    }

    /// Add a lite member (no CRDT state).
    pub fn add_lite_member(&self) -> ReplicaId {
        self.add_member(false)
    }

    fn add_member(&self, data_member: bool) -> ReplicaId {
        let id = ReplicaId::new();
        self.state.write().members.push(MemberRecord {
            id,
            data_member,
            reachable: true,
        });
        debug!(member = %id, data_member, "member joined grid");
        id
    }

    /// Remove a member from the cluster entirely.
    pub fn remove_member(&self, member: &ReplicaId) {
        self.state.write().members.retain(|m| m.id != *member);
    }

    /// Keep the member in the membership list but refuse its invocations.
    pub fn disconnect(&self, member: &ReplicaId) {
        self.set_reachable(member, false);
    }

    /// Make a disconnected member reachable again.
    pub fn reconnect(&self, member: &ReplicaId) {
        self.set_reachable(member, true);
    }

    fn set_reachable(&self, member: &ReplicaId, reachable: bool) {
        let mut state = self.state.write();
        if let Some(record) = state.members.iter_mut().find(|m| m.id == *member) {
            record.reachable = reachable;
        }
    }

    /// Wipe a counter's state, as if the hosting replicas restarted. Clients
    /// that already observed the counter will hit a consistency violation on
    /// their next operation.
    pub fn wipe_counter(&self, counter_id: &str) {
        self.state.write().counters.remove(counter_id);
    }

    /// The authoritative value of a counter (0 if never touched).
    pub fn counter_value(&self, counter_id: &str) -> i64 {
        self.state
            .read()
            .counters
            .get(counter_id)
            .map(|c| c.value)
            .unwrap_or(0)
    }

    /// Validate the target and run `apply` against the counter state.
    fn serve(
        &self,
        target: ReplicaId,
        counter_id: &str,
        observed: &VectorClock,
        apply: impl FnOnce(&mut CounterState) -> i64,
    ) -> Result<CounterResponse, InvokeFailure> {
        let mut state = self.state.write();

        let Some(record) = state.members.iter().find(|m| m.id == target) else {
            return Err(InvokeFailure::MemberUnreachable("member left cluster".into()));
        };
        if !record.reachable {
            return Err(InvokeFailure::MemberUnreachable("connection refused".into()));
        }
        if !record.data_member {
            return Err(InvokeFailure::NoDataMember);
        }

        let counter = state.counters.entry(counter_id.to_string()).or_default();

        // The replica can serve the session only if its clock covers
        // everything the client has already observed.
        if !counter.clock().is_after(observed) {
            return Err(InvokeFailure::ConsistencyViolation(format!(
                "replica {target} is behind the session's observed clock"
            )));
        }

        let value = apply(counter);
        *counter.timestamps.entry(target).or_insert(0) += 1;

        Ok(CounterResponse {
            value,
            replica_timestamps: counter.timestamps.iter().map(|(r, &ts)| (*r, ts)).collect(),
        })
    }
}

impl MembershipView for MemoryGrid {
    fn current_data_members(&self) -> Vec<ReplicaId> {
        self.state
            .read()
            .members
            .iter()
            .filter(|m| m.data_member)
            .map(|m| m.id)
            .collect()
    }
}

#[async_trait]
impl CounterInvoker for MemoryGrid {
    async fn invoke_add(
        &self,
        target: ReplicaId,
        counter_id: &str,
        delta: i64,
        get_before_update: bool,
        observed: &VectorClock,
    ) -> Result<CounterResponse, InvokeFailure> {
        self.serve(target, counter_id, observed, |counter| {
            let before = counter.value;
            counter.value = counter.value.saturating_add(delta);
            if get_before_update {
                before
            } else {
                counter.value
            }
        })
    }

    async fn invoke_get(
        &self,
        target: ReplicaId,
        counter_id: &str,
        observed: &VectorClock,
    ) -> Result<CounterResponse, InvokeFailure> {
        self.serve(target, counter_id, observed, |counter| counter.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CounterConfig, PNCounterClient};
    use crate::error::CounterError;
    use std::sync::Arc;

    fn counter_on(
        grid: &Arc<MemoryGrid>,
        name: &str,
    ) -> PNCounterClient<MemoryGrid, MemoryGrid> {
        PNCounterClient::new(name, grid.clone(), grid.clone(), CounterConfig::default())
    }

    #[tokio::test]
    async fn test_end_to_end_session_consistent_read() {
        let grid = Arc::new(MemoryGrid::with_data_members(3));
        let counter = counter_on(&grid, "hits");

        assert_eq!(counter.add_and_get(5).await.unwrap(), 5);
        let pinned = counter.current_target().await.unwrap();

        assert_eq!(counter.get().await.unwrap(), 5);
        // Sticky routing: the same replica served the read.
        assert_eq!(counter.current_target().await, Some(pinned));
    }

    #[tokio::test]
    async fn test_arithmetic_surface() {
        let grid = Arc::new(MemoryGrid::with_data_members(1));
        let counter = counter_on(&grid, "ops");

        assert_eq!(counter.increment_and_get().await.unwrap(), 1);
        assert_eq!(counter.get_and_increment().await.unwrap(), 1);
        assert_eq!(counter.get_and_decrement().await.unwrap(), 2);
        assert_eq!(counter.decrement_and_get().await.unwrap(), 0);
        assert_eq!(counter.add_and_get(10).await.unwrap(), 10);
        assert_eq!(counter.get_and_add(5).await.unwrap(), 10);
        assert_eq!(counter.subtract_and_get(3).await.unwrap(), 12);
        assert_eq!(counter.get_and_subtract(2).await.unwrap(), 12);
        assert_eq!(counter.get().await.unwrap(), 10);
        assert_eq!(grid.counter_value("ops"), 10);
    }

    #[tokio::test]
    async fn test_failover_preserves_session() {
        let grid = Arc::new(MemoryGrid::with_data_members(3));
        let counter = counter_on(&grid, "hits");

        counter.add_and_get(7).await.unwrap();
        let first = counter.current_target().await.unwrap();

        grid.disconnect(&first);
        // Retries inside the same call and lands on another member.
        assert_eq!(counter.get().await.unwrap(), 7);
        let second = counter.current_target().await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_all_members_unreachable_reports_root_cause() {
        let grid = Arc::new(MemoryGrid::with_data_members(2));
        let counter = counter_on(&grid, "hits");
        counter.add_and_get(1).await.unwrap();

        for member in grid.current_data_members() {
            grid.disconnect(&member);
        }
        let err = counter.get().await.unwrap_err();
        assert!(matches!(err, CounterError::MemberUnreachable { .. }));
    }

    #[tokio::test]
    async fn test_lite_members_are_never_targeted() {
        let grid = Arc::new(MemoryGrid::new());
        grid.add_lite_member();
        grid.add_lite_member();
        let counter = counter_on(&grid, "hits");

        // Lite members never appear in the data-member view.
        let err = counter.add_and_get(1).await.unwrap_err();
        assert!(matches!(err, CounterError::NoDataMemberInCluster));
    }

    #[tokio::test]
    async fn test_wipe_causes_consistency_loss_until_reset() {
        let grid = Arc::new(MemoryGrid::with_data_members(2));
        let counter = counter_on(&grid, "hits");
        counter.add_and_get(42).await.unwrap();

        grid.wipe_counter("hits");
        let err = counter.get().await.unwrap_err();
        assert!(matches!(err, CounterError::ConsistencyLost(_)));
        // Still terminal on the next call: the poisoned clock persists.
        let err = counter.get().await.unwrap_err();
        assert!(matches!(err, CounterError::ConsistencyLost(_)));

        counter.reset().await;
        assert_eq!(counter.get().await.unwrap(), 0);
        assert_eq!(counter.add_and_get(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_member_removal_fails_over() {
        let grid = Arc::new(MemoryGrid::with_data_members(2));
        let counter = counter_on(&grid, "hits");
        counter.add_and_get(3).await.unwrap();
        let first = counter.current_target().await.unwrap();

        grid.remove_member(&first);
        assert_eq!(counter.get().await.unwrap(), 3);
        assert_ne!(counter.current_target().await, Some(first));
    }

    #[tokio::test]
    async fn test_observed_clock_tracks_serving_replica() {
        let grid = Arc::new(MemoryGrid::with_data_members(1));
        let counter = counter_on(&grid, "hits");

        counter.add_and_get(1).await.unwrap();
        counter.add_and_get(1).await.unwrap();

        let pinned = counter.current_target().await.unwrap();
        assert_eq!(counter.observed_clock().await.get(&pinned), Some(2));
    }

    #[tokio::test]
    async fn test_two_proxies_are_independent_sessions() {
        let grid = Arc::new(MemoryGrid::with_data_members(2));
        let a = counter_on(&grid, "hits");
        let b = counter_on(&grid, "hits");

        a.add_and_get(5).await.unwrap();
        // `b` has its own session: empty clock, own pin, same authority.
        assert!(b.observed_clock().await.is_empty());
        assert_eq!(b.get().await.unwrap(), 5);
    }
}
