//! Rolling per-sensor statistics for machine telemetry.
//!
//! Every (machine, sensor) pair gets its own [`RollingWindow`]. Computing the
//! features of a sample first folds each metric into its window and then
//! reports `<metric>_sma`, `<metric>_derivative`, `<metric>_min` and
//! `<metric>_max`, rounded to two decimal places.

use std::collections::HashMap;

use sync_client::types::{FeatureSet, TelemetrySample};
use tracing::debug;

mod window;

pub use window::RollingWindow;

pub const DEFAULT_WINDOW_SIZE: usize = 10;

const FEATURE_SUFFIXES: [&str; 4] = ["sma", "derivative", "min", "max"];

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct WindowKey {
    machine_id: String,
    sensor: String,
}

#[derive(Debug)]
pub struct FeatureEngine {
    window_size: usize,
    windows: HashMap<WindowKey, RollingWindow>,
}

impl Default for FeatureEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl FeatureEngine {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            windows: HashMap::new(),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn tracked_windows(&self) -> usize {
        self.windows.len()
    }

    pub fn window(&self, machine_id: &str, sensor: &str) -> Option<Vec<f64>> {
        let key = WindowKey {
            machine_id: machine_id.to_string(),
            sensor: sensor.to_string(),
        };
        self.windows.get(&key).map(RollingWindow::values)
    }

    pub fn add_reading(&mut self, machine_id: &str, sensor: &str, value: f64) {
        self.window_mut(machine_id, sensor).push(value);
    }

    pub fn compute_features(&mut self, sample: &TelemetrySample) -> FeatureSet {
        let mut out = FeatureSet::empty(sample.machine_id.clone(), sample.timestamp);
        for (sensor, value) in &sample.metrics {
            let window = self.window_mut(&sample.machine_id, sensor);
            window.push(*value);

            let stats = [
                window.sma(),
                window.derivative(),
                window.min(),
                window.max(),
            ];
            for (suffix, stat) in FEATURE_SUFFIXES.iter().zip(stats) {
                out.features
                    .insert(format!("{sensor}_{suffix}"), round2(stat));
            }
        }
        out
    }

    fn window_mut(&mut self, machine_id: &str, sensor: &str) -> &mut RollingWindow {
        let key = WindowKey {
            machine_id: machine_id.to_string(),
            sensor: sensor.to_string(),
        };
        let window_size = self.window_size;
        self.windows.entry(key).or_insert_with(|| {
            debug!(machine_id, sensor, window_size, "tracking new sensor window");
            RollingWindow::new(window_size)
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests;
