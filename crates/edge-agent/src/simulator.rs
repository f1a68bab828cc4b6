//! Synthetic sensor producer standing in for field ingestion.
//!
//! Each machine walks through three phases keyed by its cycle counter:
//! normal readings, slow drift, and finally drift with occasional failure
//! spikes. Samples go straight into the shared [`TelemetryBuffer`].

use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use sync_client::{TelemetryBuffer, TelemetrySample};

mod profiles;

pub use profiles::{profile_for, FailureMode, MachineProfile};

pub const NORMAL_PHASE_CYCLES: u64 = 50;
pub const DRIFT_PHASE_CYCLES: u64 = 50;

const FAILURE_PHASE_PROBABILITY: f64 = 0.25;
const FAILURE_ANOMALY_PROBABILITY: f64 = 0.2 * 1.5;
const MAX_DRIFT_INTENSITY: f64 = 0.1;
const DEGRADING_METRICS: [&str; 3] = ["vibration", "temperature", "co2_ppm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Normal,
    Drift,
    Failure,
}

#[derive(Debug)]
struct MachineState {
    machine_id: String,
    profile: &'static MachineProfile,
    cycle: u64,
}

#[derive(Debug)]
pub struct SensorSimulator {
    machines: Vec<MachineState>,
    rng: SmallRng,
}

impl SensorSimulator {
    pub fn new(machine_ids: &[String]) -> Self {
        Self::with_rng(machine_ids, SmallRng::from_entropy())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn seeded(machine_ids: &[String], seed: u64) -> Self {
        Self::with_rng(machine_ids, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(machine_ids: &[String], rng: SmallRng) -> Self {
        let machines = machine_ids
            .iter()
            .map(|id| MachineState {
                machine_id: id.trim().to_string(),
                profile: profile_for(id),
                cycle: 0,
            })
            .collect();
        Self { machines, rng }
    }

    pub fn machine_ids(&self) -> Vec<&str> {
        self.machines.iter().map(|m| m.machine_id.as_str()).collect()
    }

    /// One reading per machine; advances every machine's cycle.
    pub fn next_batch(&mut self, now: DateTime<Utc>) -> Vec<TelemetrySample> {
        let rng = &mut self.rng;
        self.machines
            .iter_mut()
            .map(|machine| {
                let sample = build_sample(rng, machine, now);
                machine.cycle += 1;
                sample
            })
            .collect()
    }
}

fn build_sample(rng: &mut impl Rng, machine: &MachineState, now: DateTime<Utc>) -> TelemetrySample {
    let cycle = machine.cycle;
    let phase = phase_for(rng, cycle);
    let mut metrics = normal_metrics(rng, machine.profile);

    match phase {
        Phase::Normal => {}
        Phase::Drift => apply_drift(rng, &mut metrics, drift_intensity(cycle)),
        Phase::Failure => {
            if rng.gen::<f64>() < FAILURE_ANOMALY_PROBABILITY {
                if let Some(mode) = machine.profile.kind.failure_modes().choose(rng) {
                    info!(
                        machine_id = %machine.machine_id,
                        failure = mode.label(),
                        cycle,
                        "injecting failure spike"
                    );
                    apply_failure_spike(rng, &mut metrics, *mode);
                }
            }
        }
    }

    if cycle % 10 == 0 {
        debug!(
            machine_id = %machine.machine_id,
            kind = machine.profile.kind.label(),
            ?phase,
            cycle,
            "simulated reading"
        );
    }

    TelemetrySample {
        machine_id: machine.machine_id.clone(),
        timestamp: now,
        metrics,
    }
}

pub fn phase_for(rng: &mut impl Rng, cycle: u64) -> Phase {
    if cycle < NORMAL_PHASE_CYCLES {
        Phase::Normal
    } else if cycle < NORMAL_PHASE_CYCLES + DRIFT_PHASE_CYCLES {
        Phase::Drift
    } else if rng.gen::<f64>() < FAILURE_PHASE_PROBABILITY {
        Phase::Failure
    } else {
        Phase::Drift
    }
}

pub fn drift_intensity(cycle: u64) -> f64 {
    (cycle as f64 / DRIFT_PHASE_CYCLES as f64).min(1.0) * MAX_DRIFT_INTENSITY
}

/// Gaussian around the range midpoint with sigma = range/6, clamped.
pub fn normal_metrics(rng: &mut impl Rng, profile: &MachineProfile) -> BTreeMap<String, f64> {
    profile
        .metrics
        .iter()
        .map(|m| {
            let value = if m.min == m.max {
                m.min
            } else {
                let mean = (m.min + m.max) / 2.0;
                let std_dev = (m.max - m.min) / 6.0;
                round2((mean + std_dev * standard_normal(rng)).clamp(m.min, m.max))
            };
            (m.name.to_string(), value)
        })
        .collect()
}

pub fn apply_drift(rng: &mut impl Rng, metrics: &mut BTreeMap<String, f64>, factor: f64) {
    for (name, value) in metrics.iter_mut() {
        let scale = if DEGRADING_METRICS.contains(&name.as_str()) {
            1.0 + rng.gen_range(0.0..=factor)
        } else if name == "rpm" {
            1.0 - rng.gen_range(0.0..=factor * 0.5)
        } else {
            rng.gen_range(0.98..=1.02)
        };
        *value = round2(*value * scale);
    }
}

pub fn apply_failure_spike(
    rng: &mut impl Rng,
    metrics: &mut BTreeMap<String, f64>,
    mode: FailureMode,
) {
    let spikes: [(&str, f64, f64); 2] = match mode {
        FailureMode::Vibration => [("vibration", 1.8, 2.8), ("temperature", 1.1, 1.3)],
        FailureMode::Temperature => [("temperature", 1.3, 1.6), ("co2_ppm", 1.1, 1.2)],
        FailureMode::Emission => [("co2_ppm", 1.3, 1.7), ("fuel_rate_lh", 1.2, 1.4)],
    };
    for (name, low, high) in spikes {
        if let Some(value) = metrics.get_mut(name) {
            *value *= rng.gen_range(low..=high);
        }
    }
    for value in metrics.values_mut() {
        *value = round2(*value);
    }
}

/// Feeds the buffer once per `interval` until cancelled. Returns the number
/// of samples the buffer accepted.
pub async fn run_simulator(
    mut simulator: SensorSimulator,
    buffer: Arc<TelemetryBuffer>,
    every: Duration,
    cancel: CancellationToken,
) -> u64 {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut accepted = 0u64;

    info!(
        machines = ?simulator.machine_ids(),
        interval_ms = every.as_millis() as u64,
        "sensor simulator started"
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                for sample in simulator.next_batch(Utc::now()) {
                    if buffer.try_add(sample) {
                        accepted += 1;
                    }
                }
            }
        }
    }

    info!(accepted, "sensor simulator stopped");
    accepted
}

fn standard_normal(rng: &mut impl Rng) -> f64 {
    // Box-Muller; u1 in (0, 1] keeps ln finite.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
