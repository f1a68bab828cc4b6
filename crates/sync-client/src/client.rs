use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::breaker::{BreakerError, CircuitBreaker};
use crate::retry::{RetryError, RetryPolicy, Retryable};
use crate::types::{FeatureSet, Payload, PayloadKind, TelemetrySample};

mod client_http;

pub use client_http::{HttpSink, TimeoutConfig, PATH_FEATURES, PATH_RAW};

/// Failure of a single upstream delivery attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SinkError {
    #[error("upstream request timed out: {0}")]
    Timeout(String),
    #[error("upstream transport error: {0}")]
    Transport(String),
    #[error("upstream responded with status {code}")]
    Status { code: u16 },
    #[error("failed encoding payload: {0}")]
    Encode(String),
}

impl Retryable for SinkError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Status { code } => *code >= 500 || *code == 408 || *code == 429,
            Self::Encode(_) => false,
        }
    }
}

/// Destination for raw samples and derived feature sets.
#[async_trait]
pub trait UpstreamSink: Send + Sync {
    async fn send_raw(&self, sample: &TelemetrySample) -> Result<(), SinkError>;
    async fn send_features(&self, features: &FeatureSet) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("circuit breaker '{breaker}' is open")]
    CircuitOpen { breaker: String },
    #[error("payload rejected by upstream: {0}")]
    Rejected(#[source] SinkError),
    #[error("delivery failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: SinkError,
    },
}

impl From<BreakerError<RetryError<SinkError>>> for ForwardError {
    fn from(err: BreakerError<RetryError<SinkError>>) -> Self {
        match err {
            BreakerError::Open { name } => Self::CircuitOpen { breaker: name },
            BreakerError::Inner(RetryError::Exhausted { attempts, last, .. }) => {
                Self::Exhausted { attempts, last }
            }
            BreakerError::Inner(RetryError::Permanent { error, .. }) => Self::Rejected(error),
        }
    }
}

#[derive(Debug, Default)]
pub struct ClientStats {
    delivered: AtomicU64,
    failed: AtomicU64,
    circuit_rejected: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClientStatsSnapshot {
    pub delivered: u64,
    pub failed: u64,
    pub circuit_rejected: u64,
}

impl ClientStats {
    pub fn snapshot(&self) -> ClientStatsSnapshot {
        ClientStatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            circuit_rejected: self.circuit_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Delivers payloads to an [`UpstreamSink`] with retry inside a circuit
/// breaker. A whole retry sequence counts as one breaker call, and only
/// transient failures count against the breaker.
pub struct ForwardingClient<S> {
    sink: Arc<S>,
    retry: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
    stats: ClientStats,
}

impl<S: UpstreamSink> ForwardingClient<S> {
    pub fn new(sink: Arc<S>, retry: RetryPolicy, breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            sink,
            retry,
            breaker,
            stats: ClientStats::default(),
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn stats(&self) -> ClientStatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns true iff the payload was delivered. Never panics or errors.
    pub async fn forward(&self, payload: Payload<'_>) -> bool {
        match self.try_forward(payload).await {
            Ok(()) => true,
            Err(ForwardError::CircuitOpen { breaker }) => {
                debug!(
                    kind = %payload.kind(),
                    machine_id = payload.machine_id(),
                    breaker = %breaker,
                    "circuit open, payload not forwarded"
                );
                false
            }
            Err(err) => {
                warn!(
                    kind = %payload.kind(),
                    machine_id = payload.machine_id(),
                    error = %err,
                    "failed forwarding payload"
                );
                false
            }
        }
    }

    pub async fn forward_raw(&self, sample: &TelemetrySample) -> bool {
        self.forward(Payload::Raw(sample)).await
    }

    pub async fn forward_features(&self, features: &FeatureSet) -> bool {
        self.forward(Payload::Features(features)).await
    }

    pub async fn try_forward(&self, payload: Payload<'_>) -> Result<(), ForwardError> {
        let operation = match payload.kind() {
            PayloadKind::Raw => "send_raw",
            PayloadKind::Features => "send_features",
        };
        let sink = &self.sink;

        let result = self
            .breaker
            .call_filtered(
                || {
                    self.retry.execute(operation, move || async move {
                        match payload {
                            Payload::Raw(sample) => sink.send_raw(sample).await,
                            Payload::Features(features) => sink.send_features(features).await,
                        }
                    })
                },
                |err: &RetryError<SinkError>| err.last_error().is_retryable(),
            )
            .await;

        match result {
            Ok(()) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(err) => {
                if err.is_open() {
                    self.stats.circuit_rejected.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.stats.failed.fetch_add(1, Ordering::Relaxed);
                }
                Err(err.into())
            }
        }
    }
}
