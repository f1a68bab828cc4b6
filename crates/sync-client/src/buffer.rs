use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::types::TelemetrySample;

pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// Capacity-bounded holding area between ingestion and the sync loop.
///
/// Producers call [`TelemetryBuffer::try_add`] from any thread or task; the
/// sync loop is the single consumer calling [`TelemetryBuffer::drain_all`].
/// When full, incoming samples are dropped (drop-newest) and counted.
#[derive(Debug)]
pub struct TelemetryBuffer {
    queue: Mutex<VecDeque<TelemetrySample>>,
    capacity: usize,
    accepted: AtomicU64,
    dropped: AtomicU64,
}

impl TelemetryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_BUFFER_CAPACITY))),
            capacity,
            accepted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn try_add(&self, sample: TelemetrySample) -> bool {
        let mut queue = self.lock();
        if queue.len() >= self.capacity {
            drop(queue);
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(
                machine_id = %sample.machine_id,
                capacity = self.capacity,
                dropped,
                "telemetry buffer full, dropping sample"
            );
            return false;
        }
        queue.push_back(sample);
        self.accepted.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn drain_all(&self) -> Vec<TelemetrySample> {
        let mut queue = self.lock();
        queue.drain(..).collect()
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn accepted_count(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    // A panicking holder can only have left the queue between whole
    // push/drain operations, so the data is still consistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<TelemetrySample>> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for TelemetryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

#[cfg(test)]
mod tests;
