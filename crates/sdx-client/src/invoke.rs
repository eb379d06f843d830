//! Invocation interface to the grid.
//!
//! The client does not speak the wire protocol itself; it hands each
//! operation to a [`CounterInvoker`] implemented by the surrounding transport
//! layer. Failures come back as an explicit [`InvokeFailure`] kind that the
//! retry loop branches on directly, rather than as opaque errors the client
//! would have to inspect at runtime.

use async_trait::async_trait;
use sdx_clock::{ReplicaId, VectorClock};
use serde::{Deserialize, Serialize};

/// Why an invocation against a specific member failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvokeFailure {
    /// The member left, terminated, or could not be reached. Retryable
    /// against another member within the same call.
    MemberUnreachable(String),
    /// The target replica cannot satisfy the client's observed clock, e.g.
    /// its state was reset or the replica set changed incompatibly. Terminal
    /// for the session.
    ConsistencyViolation(String),
    /// The cluster has members, but none capable of hosting CRDT state.
    NoDataMember,
    /// Any other failure. Never retried.
    Other(String),
}

/// A successful invocation result: the operation's value plus the full
/// replica-timestamp snapshot the responding replica holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterResponse {
    /// The counter value the operation observed or produced.
    pub value: i64,
    /// The responding replica's per-replica logical timestamps.
    pub replica_timestamps: Vec<(ReplicaId, u64)>,
}

/// Transport-level invoker for counter operations.
///
/// The `observed` clock travels with every request so the server can detect
/// when the client's session is causally ahead of what the target replica
/// holds.
#[async_trait]
pub trait CounterInvoker: Send + Sync + 'static {
    /// Apply `delta` to the counter at `target`, returning the value before
    /// or after the update depending on `get_before_update`.
    async fn invoke_add(
        &self,
        target: ReplicaId,
        counter_id: &str,
        delta: i64,
        get_before_update: bool,
        observed: &VectorClock,
    ) -> Result<CounterResponse, InvokeFailure>;

    /// Read the counter value at `target`.
    async fn invoke_get(
        &self,
        target: ReplicaId,
        counter_id: &str,
        observed: &VectorClock,
    ) -> Result<CounterResponse, InvokeFailure>;
}
