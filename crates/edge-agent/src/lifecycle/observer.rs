use std::sync::{Arc, Mutex, MutexGuard};

use sync_client::{CircuitBreaker, TelemetryBuffer};

use super::types::{PipelineMetrics, PipelineSnapshot};

/// Cloneable read handle over a running driver.
#[derive(Debug, Clone)]
pub struct PipelineObserver {
    metrics: Arc<Mutex<PipelineMetrics>>,
    buffer: Arc<TelemetryBuffer>,
    breaker: Arc<CircuitBreaker>,
}

impl PipelineObserver {
    pub(super) fn new(
        metrics: Arc<Mutex<PipelineMetrics>>,
        buffer: Arc<TelemetryBuffer>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            metrics,
            buffer,
            breaker,
        }
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        let metrics = lock_metrics(&self.metrics).clone();
        PipelineSnapshot {
            stage: metrics.stage,
            buffer_size: self.buffer.size(),
            buffer_capacity: self.buffer.capacity(),
            buffer_accepted: self.buffer.accepted_count(),
            buffer_dropped: self.buffer.dropped_count(),
            breaker: self.breaker.snapshot(),
            delivery: metrics.delivery,
            cycles_run: metrics.cycles_run,
            last_cycle: metrics.last_cycle,
            totals: metrics.totals,
        }
    }
}

pub(super) fn lock_metrics(metrics: &Mutex<PipelineMetrics>) -> MutexGuard<'_, PipelineMetrics> {
    metrics
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
