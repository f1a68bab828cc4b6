use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

use feature_engine::FeatureEngine;
use sync_client::{ForwardingClient, TelemetryBuffer, UpstreamSink};

mod cycle;
mod observer;
mod types;

pub use observer::PipelineObserver;
pub use types::{CycleStats, DriverStage, PipelineSnapshot};

use observer::lock_metrics;
use types::PipelineMetrics;

/// Sync loop: owns the feature engine and the forwarding client and is the
/// single consumer of the telemetry buffer.
pub struct PipelineDriver<S> {
    buffer: Arc<TelemetryBuffer>,
    engine: FeatureEngine,
    client: ForwardingClient<S>,
    interval: Duration,
    metrics: Arc<Mutex<PipelineMetrics>>,
}

impl<S: UpstreamSink> PipelineDriver<S> {
    pub fn new(
        buffer: Arc<TelemetryBuffer>,
        engine: FeatureEngine,
        client: ForwardingClient<S>,
        interval: Duration,
    ) -> Self {
        Self {
            buffer,
            engine,
            client,
            interval,
            metrics: Arc::new(Mutex::new(PipelineMetrics::default())),
        }
    }

    pub fn observer(&self) -> PipelineObserver {
        PipelineObserver::new(
            Arc::clone(&self.metrics),
            Arc::clone(&self.buffer),
            Arc::clone(self.client.breaker()),
        )
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn stage(&self) -> DriverStage {
        lock_metrics(&self.metrics).stage
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn engine(&self) -> &FeatureEngine {
        &self.engine
    }

    /// Runs cycles on a fixed interval until `cancel` fires. Cancellation is
    /// only observed between cycles, so an in-flight cycle always completes.
    /// Returns the cumulative totals.
    pub async fn run(mut self, cancel: CancellationToken) -> CycleStats {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.interval.as_secs_f64(),
            buffer_capacity = self.buffer.capacity(),
            window_size = self.engine.window_size(),
            "pipeline driver started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        let metrics = lock_metrics(&self.metrics).clone();
        info!(
            cycles = metrics.cycles_run,
            processed = metrics.totals.processed,
            succeeded = metrics.totals.succeeded,
            failed = metrics.totals.failed,
            "pipeline driver stopped"
        );
        metrics.totals
    }
}
