//! Upstream delivery for edge telemetry: the shared data model, the bounded
//! in-memory buffer, and a forwarding client that wraps an [`UpstreamSink`]
//! in exponential-backoff retry and a circuit breaker.

pub mod breaker;
pub mod buffer;
mod client;
pub mod retry;
pub mod types;

pub use breaker::{
    BreakerConfig, BreakerError, BreakerSnapshot, CircuitBreaker, CircuitState, StateListener,
    StateTransition,
};
pub use buffer::{TelemetryBuffer, DEFAULT_BUFFER_CAPACITY};
pub use client::{
    ClientStats, ClientStatsSnapshot, ForwardError, ForwardingClient, HttpSink, SinkError,
    TimeoutConfig, UpstreamSink, PATH_FEATURES, PATH_RAW,
};
pub use retry::{RetryError, RetryPolicy, Retryable};
pub use types::{FeatureSet, Payload, PayloadKind, TelemetrySample};
