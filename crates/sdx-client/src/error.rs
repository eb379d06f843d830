//! Error types for counter operations.

use sdx_clock::ReplicaId;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by counter operations.
///
/// Every call ends in either a value or exactly one of these; transient
/// member failures are retried internally and only surface once every
/// candidate replica has been exhausted.
#[derive(Error, Debug, Clone)]
pub enum CounterError {
    /// The session's causal view can no longer be satisfied by any replica.
    /// Terminal for the current session: only an explicit
    /// [`reset`](crate::client::PNCounterClient::reset) permits further
    /// successful operations on this proxy.
    #[error("counter session consistency lost: {0}; reset() starts a new session")]
    ConsistencyLost(String),

    /// The cluster holds no member capable of hosting CRDT state.
    #[error("no data member in cluster; CRDT state requires at least one data member")]
    NoDataMemberInCluster,

    /// The last candidate replica became unreachable before the call could
    /// complete. Raised only after every candidate has been excluded, so the
    /// root cause of the exhaustion is preserved.
    #[error("target replica {member} unreachable: {reason}")]
    MemberUnreachable { member: ReplicaId, reason: String },

    /// The operation deadline elapsed before the retry loop completed.
    #[error("counter operation exceeded its deadline of {deadline:?}")]
    DeadlineExceeded { deadline: Duration },

    /// An invocation failed for an unclassified reason. Never retried: a
    /// retry could double-apply an operation that succeeded server-side but
    /// failed to acknowledge.
    #[error("counter invocation failed: {0}")]
    Invocation(String),
}

/// Result type for counter operations.
pub type Result<T> = std::result::Result<T, CounterError>;
