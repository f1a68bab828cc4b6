//! Circuit breaker guarding a single named upstream dependency.
//!
//! ```text
//! Closed   -> Open:     consecutive failures >= fail_max
//! Open     -> HalfOpen: timeout elapsed since the circuit opened (on next call)
//! HalfOpen -> Closed:   the single probe call succeeds
//! HalfOpen -> Open:     the probe fails (open timer restarts)
//! ```
//!
//! Transitions are decided under one mutex so concurrent callers agree on a
//! single winner. The lock is never held across the guarded call.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerConfig {
    pub fail_max: u32,
    pub timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            fail_max: 5,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub breaker: String,
    pub from: CircuitState,
    pub to: CircuitState,
    pub consecutive_failures: u32,
}

/// Receives every state transition after it has been committed.
pub trait StateListener: Send + Sync {
    fn on_state_change(&self, transition: &StateTransition);
}

#[derive(Debug, thiserror::Error)]
pub enum BreakerError<E> {
    #[error("circuit breaker '{name}' is open, call rejected")]
    Open { name: String },
    #[error("{0}")]
    Inner(E),
}

impl<E> BreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub fail_max: u32,
    pub rejected: u64,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
    rejected: AtomicU64,
    listener: Option<Arc<dyn StateListener>>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("inner", &*self.lock())
            .field("rejected", &self.rejected_count())
            .finish()
    }
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
            rejected: AtomicU64::new(0),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn StateListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            fail_max: self.config.fail_max,
            rejected: self.rejected_count(),
        }
    }

    /// Runs `op` through the breaker; every error counts as a failure.
    pub async fn call<T, E, F, Fut>(&self, op: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call_filtered(op, |_| true).await
    }

    /// Runs `op` through the breaker. Errors for which `trips` returns false
    /// are passed through but recorded as a healthy response.
    pub async fn call_filtered<T, E, F, Fut, P>(
        &self,
        op: F,
        trips: P,
    ) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnOnce(&E) -> bool,
    {
        let Some(permit) = self.try_acquire() else {
            return Err(BreakerError::Open {
                name: self.name.clone(),
            });
        };

        match op().await {
            Ok(value) => {
                permit.settle(true);
                Ok(value)
            }
            Err(err) => {
                permit.settle(!trips(&err));
                Err(BreakerError::Inner(err))
            }
        }
    }

    fn try_acquire(&self) -> Option<CallPermit<'_>> {
        let mut transition = None;
        let probe = {
            let mut inner = self.lock();
            let state = inner.state;
            match state {
                CircuitState::Closed => false,
                CircuitState::Open => {
                    let cooled_down = inner
                        .opened_at
                        .map_or(true, |at| at.elapsed() >= self.config.timeout);
                    if !cooled_down {
                        drop(inner);
                        self.reject();
                        return None;
                    }
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_in_flight = true;
                    transition = Some(self.transition(
                        CircuitState::Open,
                        CircuitState::HalfOpen,
                        inner.consecutive_failures,
                    ));
                    true
                }
                CircuitState::HalfOpen => {
                    if inner.probe_in_flight {
                        drop(inner);
                        self.reject();
                        return None;
                    }
                    inner.probe_in_flight = true;
                    true
                }
            }
        };

        self.notify(transition);
        Some(CallPermit {
            breaker: self,
            probe,
            settled: false,
        })
    }

    fn record_success(&self, probe: bool) {
        let mut transition = None;
        {
            let mut inner = self.lock();
            let state = inner.state;
            match state {
                CircuitState::Closed => inner.consecutive_failures = 0,
                CircuitState::HalfOpen if probe => {
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.opened_at = None;
                    inner.probe_in_flight = false;
                    transition = Some(self.transition(
                        CircuitState::HalfOpen,
                        CircuitState::Closed,
                        0,
                    ));
                }
                // A call admitted before the circuit opened cannot close it.
                CircuitState::HalfOpen | CircuitState::Open => {}
            }
        }
        self.notify(transition);
    }

    fn record_failure(&self, probe: bool) {
        let mut transition = None;
        {
            let mut inner = self.lock();
            inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
            let state = inner.state;
            match state {
                CircuitState::Closed if inner.consecutive_failures >= self.config.fail_max => {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    transition = Some(self.transition(
                        CircuitState::Closed,
                        CircuitState::Open,
                        inner.consecutive_failures,
                    ));
                }
                CircuitState::HalfOpen if probe => {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    inner.probe_in_flight = false;
                    transition = Some(self.transition(
                        CircuitState::HalfOpen,
                        CircuitState::Open,
                        inner.consecutive_failures,
                    ));
                }
                _ => {}
            }
        }
        self.notify(transition);
    }

    fn reject(&self) {
        let rejected = self.rejected.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(breaker = %self.name, rejected, "circuit open, rejecting call");
    }

    fn transition(
        &self,
        from: CircuitState,
        to: CircuitState,
        consecutive_failures: u32,
    ) -> StateTransition {
        StateTransition {
            breaker: self.name.clone(),
            from,
            to,
            consecutive_failures,
        }
    }

    fn notify(&self, transition: Option<StateTransition>) {
        let Some(transition) = transition else {
            return;
        };
        warn!(
            breaker = %transition.breaker,
            old_state = %transition.from,
            new_state = %transition.to,
            fail_count = transition.consecutive_failures,
            fail_max = self.config.fail_max,
            "circuit breaker state changed"
        );
        if let Some(listener) = &self.listener {
            listener.on_state_change(&transition);
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Admission to one guarded call. Dropping it unsettled (the call future was
/// cancelled) records a failure so a half-open probe slot is always released.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    settled: bool,
}

impl CallPermit<'_> {
    fn settle(mut self, healthy: bool) {
        self.settled = true;
        if healthy {
            self.breaker.record_success(self.probe);
        } else {
            self.breaker.record_failure(self.probe);
        }
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.record_failure(self.probe);
        }
    }
}

#[cfg(test)]
mod tests;
