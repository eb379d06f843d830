//! Per-proxy session state.
//!
//! A session is the causal view one counter proxy has built up: the highest
//! replica timestamps it has observed ([`ObservedClock`]) and the replica it
//! is pinned to ([`crate::routing::ReplicaRouter`]). Both persist across
//! calls on the same proxy and are destroyed together by a reset.

use crate::routing::ReplicaRouter;
use sdx_clock::{ReplicaId, VectorClock};
use tracing::debug;

/// The session's causal frontier, guarded against regression.
///
/// Candidate clocks replace the current clock wholesale, and only when they
/// dominate it. Merging entry by entry would manufacture a composite clock no
/// replica ever reported, so a stale or out-of-order response is simply
/// discarded instead.
#[derive(Clone, Debug, Default)]
pub struct ObservedClock {
    clock: VectorClock,
}

impl ObservedClock {
    /// Create an empty observed clock (fresh session, no causal history).
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a replica-timestamp snapshot from a server response.
    ///
    /// Builds a candidate clock and adopts it iff it dominates the current
    /// clock. Returns whether the clock was replaced. Idempotent: offering
    /// the same dominating snapshot twice leaves the same clock as once.
    pub fn update_observed_timestamps(
        &mut self,
        entries: impl IntoIterator<Item = (ReplicaId, u64)>,
    ) -> bool {
        let candidate = VectorClock::from_entries(entries);
        if candidate.is_after(&self.clock) {
            debug!(replicas = candidate.len(), "advancing observed clock");
            self.clock = candidate;
            true
        } else {
            debug!("discarding non-dominating replica timestamps");
            false
        }
    }

    /// The current causal frontier.
    pub fn clock(&self) -> &VectorClock {
        &self.clock
    }

    /// Drop all causal history.
    pub fn reset(&mut self) {
        self.clock = VectorClock::new();
    }
}

/// Everything one counter proxy remembers between calls.
#[derive(Debug, Default)]
pub struct SessionState {
    /// The session's causal frontier.
    pub observed: ObservedClock,
    /// Sticky replica routing for this session.
    pub router: ReplicaRouter,
}

impl SessionState {
    /// Create a fresh session with no history and no pinned target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session: empty clock, no pinned target. The caller
    /// explicitly accepts losing the prior session's causal guarantees.
    pub fn reset(&mut self) {
        self.observed.reset();
        self.router.clear_target();
    }
}
