//! Sardonyx PN-Counter client - session-consistent counter access
//!
//! This crate implements the client side of the Sardonyx replicated
//! PN-Counter: a counter CRDT hosted on the data members of a grid, accessed
//! through a proxy that guarantees session consistency. The server side is an
//! external, already-consistent authority; the client only decides *which*
//! replica to ask and whether a response is causally acceptable to adopt.
//!
//! # Quick Start
//!
//! ```no_run
//! use sdx_client::{CounterConfig, MemoryGrid, PNCounterClient};
//! use std::sync::Arc;
//!
//! # async fn quick_start() -> sdx_client::Result<()> {
//! let grid = Arc::new(MemoryGrid::with_data_members(3));
//!
//! let likes = PNCounterClient::new(
//!     "likes",
//!     grid.clone(),
//!     grid.clone(),
//!     CounterConfig::default(),
//! );
//!
//! likes.add_and_get(1).await?;
//! let value = likes.get().await?; // session-consistent read
//! # let _ = value;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! Each proxy owns one *session*: the replica it is pinned to and the highest
//! per-replica timestamps it has observed. Operations run a bounded retry
//! loop: pick a target, invoke, and either adopt the response's timestamp
//! snapshot (when it dominates the session's clock) or fail over / fail
//! terminally depending on the failure kind.
//!
//! - [`client`] - The counter proxy and its retry state machine
//! - [`session`] - Observed clock and per-proxy session state
//! - [`routing`] - Sticky replica selection with failover
//! - [`membership`] - Data-member view consumed by routing
//! - [`invoke`] - Transport-level invoker interface and failure kinds
//! - [`grid`] - In-memory grid simulation for tests and demos
//! - [`error`] - Error taxonomy

pub mod client;
pub mod error;
pub mod grid;
pub mod invoke;
pub mod membership;
pub mod routing;
pub mod session;

// Re-exports for convenience
pub use client::{CounterConfig, CounterConfigBuilder, PNCounterClient};
pub use error::{CounterError, Result};
pub use grid::MemoryGrid;
pub use invoke::{CounterInvoker, CounterResponse, InvokeFailure};
pub use membership::{MembershipView, MemoryMembership};
pub use routing::{ExcludedSet, ReplicaRouter};
pub use session::{ObservedClock, SessionState};

// Re-export the identity and clock types from sdx-clock
pub use sdx_clock::{ReplicaId, VectorClock};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::client::{CounterConfig, PNCounterClient};
    pub use crate::error::CounterError;
    pub use crate::invoke::{CounterInvoker, CounterResponse, InvokeFailure};
    pub use crate::membership::MembershipView;
    pub use sdx_clock::{ReplicaId, VectorClock};
}
