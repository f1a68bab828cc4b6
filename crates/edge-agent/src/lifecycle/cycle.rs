use tracing::{debug, info};

use sync_client::UpstreamSink;

use super::observer::lock_metrics;
use super::types::{CycleStats, DriverStage};
use super::PipelineDriver;

impl<S: UpstreamSink> PipelineDriver<S> {
    /// Drains the buffer, enriches every sample in FIFO order and forwards
    /// raw then features for each. Failures never abort the cycle and
    /// nothing is requeued.
    pub async fn run_cycle(&mut self) -> CycleStats {
        self.set_stage(DriverStage::Draining);
        let samples = self.buffer.drain_all();
        if samples.is_empty() {
            self.set_stage(DriverStage::Idle);
            return CycleStats::default();
        }

        self.set_stage(DriverStage::Enriching);
        let enriched: Vec<_> = samples
            .into_iter()
            .map(|sample| {
                let features = self.engine.compute_features(&sample);
                (sample, features)
            })
            .collect();

        self.set_stage(DriverStage::Forwarding);
        let mut stats = CycleStats {
            processed: enriched.len() as u64,
            ..CycleStats::default()
        };
        for (sample, features) in &enriched {
            let raw_ok = self.client.forward_raw(sample).await;
            let features_ok = self.client.forward_features(features).await;
            if raw_ok && features_ok {
                stats.succeeded += 1;
            } else {
                debug!(
                    machine_id = %sample.machine_id,
                    raw_ok,
                    features_ok,
                    "sample not fully delivered"
                );
                stats.failed += 1;
            }
        }

        self.record_cycle(stats);
        self.set_stage(DriverStage::Idle);
        stats
    }

    fn record_cycle(&self, stats: CycleStats) {
        let delivery = self.client.stats();
        let (cycles_run, totals) = {
            let mut metrics = lock_metrics(&self.metrics);
            metrics.cycles_run = metrics.cycles_run.saturating_add(1);
            metrics.last_cycle = Some(stats);
            metrics.totals.absorb(stats);
            metrics.delivery = delivery;
            (metrics.cycles_run, metrics.totals)
        };

        info!(
            cycle = cycles_run,
            processed = stats.processed,
            succeeded = stats.succeeded,
            failed = stats.failed,
            total_processed = totals.processed,
            total_succeeded = totals.succeeded,
            buffer_dropped = self.buffer.dropped_count(),
            breaker_state = %self.client.breaker().state(),
            "sync cycle complete"
        );
    }

    fn set_stage(&self, stage: DriverStage) {
        lock_metrics(&self.metrics).stage = stage;
    }
}
