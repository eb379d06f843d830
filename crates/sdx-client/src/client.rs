//! PN-Counter client proxy.
//!
//! [`PNCounterClient`] is the public face of a replicated counter: it owns
//! one session (observed clock + pinned replica), runs the bounded retry loop
//! around the transport invoker, and maps invocation failures onto the
//! [`CounterError`] taxonomy.
//!
//! The retry state machine per call is
//! `select target -> invoke -> { success | retryable failure -> select target
//! | terminal failure }`, with a per-call excluded set and the last transient
//! failure kept so candidate exhaustion reports its true root cause.

use crate::error::{CounterError, Result};
use crate::invoke::{CounterInvoker, InvokeFailure};
use crate::membership::MembershipView;
use crate::routing::ExcludedSet;
use crate::session::SessionState;
use sdx_clock::{ReplicaId, VectorClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Configuration for a counter proxy.
#[derive(Clone, Debug)]
pub struct CounterConfig {
    /// Deadline bounding the whole retry loop of a single operation.
    pub operation_deadline: Duration,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            operation_deadline: Duration::from_secs(30),
        }
    }
}

/// Builder for counter configuration.
pub struct CounterConfigBuilder {
    config: CounterConfig,
}

impl CounterConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CounterConfig::default(),
        }
    }

    pub fn operation_deadline(mut self, deadline: Duration) -> Self {
        self.config.operation_deadline = deadline;
        self
    }

    pub fn build(self) -> CounterConfig {
        self.config
    }
}

impl Default for CounterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Which invocation a call maps to.
#[derive(Clone, Copy, Debug)]
enum Operation {
    Add { delta: i64, get_before_update: bool },
    Get,
}

/// A session-consistent client proxy for one replicated PN-Counter.
///
/// The proxy pins a data member per session and gates its causal view on
/// vector-clock dominance, so successive operations never observe state older
/// than what the session has already seen. Proxies are independent: two
/// proxies for the same counter share no state.
///
/// # Example
///
/// ```no_run
/// use sdx_client::{CounterConfig, MemoryGrid, PNCounterClient};
/// use std::sync::Arc;
///
/// # async fn example() -> sdx_client::Result<()> {
/// let grid = Arc::new(MemoryGrid::new());
/// grid.add_data_member();
///
/// let counter = PNCounterClient::new(
///     "page-hits",
///     grid.clone(),
///     grid.clone(),
///     CounterConfig::default(),
/// );
/// let value = counter.add_and_get(5).await?;
/// assert_eq!(value, 5);
/// # Ok(())
/// # }
/// ```
pub struct PNCounterClient<M: MembershipView, I: CounterInvoker> {
    counter_id: String,
    membership: Arc<M>,
    invoker: Arc<I>,
    config: CounterConfig,
    session: Mutex<SessionState>,
}

impl<M: MembershipView, I: CounterInvoker> PNCounterClient<M, I> {
    /// Create a proxy for the counter named `counter_id`.
    pub fn new(
        counter_id: impl Into<String>,
        membership: Arc<M>,
        invoker: Arc<I>,
        config: CounterConfig,
    ) -> Self {
        Self {
            counter_id: counter_id.into(),
            membership,
            invoker,
            config,
            session: Mutex::new(SessionState::new()),
        }
    }

    /// The counter's name.
    pub fn counter_id(&self) -> &str {
        &self.counter_id
    }

    /// Add `delta` and return the updated value.
    pub async fn add_and_get(&self, delta: i64) -> Result<i64> {
        self.invoke(Operation::Add {
            delta,
            get_before_update: false,
        })
        .await
    }

    /// Add `delta` and return the value before the update.
    pub async fn get_and_add(&self, delta: i64) -> Result<i64> {
        self.invoke(Operation::Add {
            delta,
            get_before_update: true,
        })
        .await
    }

    /// Subtract `delta` and return the updated value.
    pub async fn subtract_and_get(&self, delta: i64) -> Result<i64> {
        self.add_and_get(delta.saturating_neg()).await
    }

    /// Subtract `delta` and return the value before the update.
    pub async fn get_and_subtract(&self, delta: i64) -> Result<i64> {
        self.get_and_add(delta.saturating_neg()).await
    }

    /// Increment by one and return the updated value.
    pub async fn increment_and_get(&self) -> Result<i64> {
        self.add_and_get(1).await
    }

    /// Decrement by one and return the updated value.
    pub async fn decrement_and_get(&self) -> Result<i64> {
        self.add_and_get(-1).await
    }

    /// Increment by one and return the value before the update.
    pub async fn get_and_increment(&self) -> Result<i64> {
        self.get_and_add(1).await
    }

    /// Decrement by one and return the value before the update.
    pub async fn get_and_decrement(&self) -> Result<i64> {
        self.get_and_add(-1).await
    }

    /// Read the counter value.
    pub async fn get(&self) -> Result<i64> {
        self.invoke(Operation::Get).await
    }

    /// Start a new session: drop the observed clock and the pinned target.
    ///
    /// Required after [`CounterError::ConsistencyLost`]. The prior session's
    /// causal guarantees are gone: the next operation may observe state older
    /// than what this proxy saw before the reset. No member is contacted.
    pub async fn reset(&self) {
        self.session.lock().await.reset();
    }

    /// Snapshot of the session's current observed clock.
    pub async fn observed_clock(&self) -> VectorClock {
        self.session.lock().await.observed.clock().clone()
    }

    /// The replica currently pinned for this session, if any.
    pub async fn current_target(&self) -> Option<ReplicaId> {
        self.session.lock().await.router.target()
    }

    async fn invoke(&self, op: Operation) -> Result<i64> {
        let deadline = self.config.operation_deadline;
        match tokio::time::timeout(deadline, self.invoke_with_retry(op)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(counter = %self.counter_id, ?deadline, "counter operation timed out");
                Err(CounterError::DeadlineExceeded { deadline })
            }
        }
    }

    /// The bounded retry loop. The session lock is held across the whole
    /// select-invoke-update sequence so concurrent calls on the same proxy
    /// cannot interleave their reads and writes of the observed clock.
    async fn invoke_with_retry(&self, op: Operation) -> Result<i64> {
        let mut session = self.session.lock().await;
        let mut excluded = ExcludedSet::new();
        let mut last_error: Option<CounterError> = None;

        loop {
            let members = self.membership.current_data_members();
            let Some(target) = session.router.select_target(&members, &excluded) else {
                // Exhausted: report the real root cause when one was
                // recorded, the generic topology error otherwise.
                return Err(last_error.unwrap_or(CounterError::NoDataMemberInCluster));
            };

            let observed = session.observed.clock();
            let outcome = match op {
                Operation::Add {
                    delta,
                    get_before_update,
                } => {
                    self.invoker
                        .invoke_add(target, &self.counter_id, delta, get_before_update, observed)
                        .await
                }
                Operation::Get => {
                    self.invoker
                        .invoke_get(target, &self.counter_id, observed)
                        .await
                }
            };

            match outcome {
                Ok(response) => {
                    // A non-dominating snapshot is discarded inside the
                    // session, but the value itself is still a valid result.
                    session
                        .observed
                        .update_observed_timestamps(response.replica_timestamps);
                    return Ok(response.value);
                }
                Err(InvokeFailure::MemberUnreachable(reason)) => {
                    debug!(counter = %self.counter_id, member = %target, %reason,
                        "replica unreachable, retrying against another member");
                    session.router.exclude_on_failure(target, &mut excluded);
                    last_error = Some(CounterError::MemberUnreachable {
                        member: target,
                        reason,
                    });
                }
                Err(InvokeFailure::ConsistencyViolation(detail)) => {
                    warn!(counter = %self.counter_id, member = %target, %detail,
                        "session consistency lost");
                    return Err(CounterError::ConsistencyLost(detail));
                }
                Err(InvokeFailure::NoDataMember) => {
                    return Err(CounterError::NoDataMemberInCluster);
                }
                Err(InvokeFailure::Other(detail)) => {
                    return Err(CounterError::Invocation(detail));
                }
            }
        }
    }
}
