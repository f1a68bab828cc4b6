use serde::Serialize;

use sync_client::{BreakerSnapshot, ClientStatsSnapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStage {
    #[default]
    Idle,
    Draining,
    Enriching,
    Forwarding,
}

impl DriverStage {
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Draining => "draining",
            Self::Enriching => "enriching",
            Self::Forwarding => "forwarding",
        }
    }
}

/// Outcome of one drain/enrich/forward pass. A sample succeeds only when
/// both its raw and feature payloads were delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl CycleStats {
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_empty(&self) -> bool {
        self.processed == 0
    }

    pub fn absorb(&mut self, other: CycleStats) {
        self.processed = self.processed.saturating_add(other.processed);
        self.succeeded = self.succeeded.saturating_add(other.succeeded);
        self.failed = self.failed.saturating_add(other.failed);
    }

    /// Percentage of processed samples fully delivered.
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.processed as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default)]
pub(super) struct PipelineMetrics {
    pub(super) stage: DriverStage,
    pub(super) cycles_run: u64,
    pub(super) last_cycle: Option<CycleStats>,
    pub(super) totals: CycleStats,
    pub(super) delivery: ClientStatsSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineSnapshot {
    pub stage: DriverStage,
    pub buffer_size: usize,
    pub buffer_capacity: usize,
    pub buffer_accepted: u64,
    pub buffer_dropped: u64,
    pub breaker: BreakerSnapshot,
    pub delivery: ClientStatsSnapshot,
    pub cycles_run: u64,
    pub last_cycle: Option<CycleStats>,
    pub totals: CycleStats,
}
