use super::*;

use chrono::{TimeZone, Utc};

fn sample(machine_id: &str, metrics: &[(&str, f64)]) -> TelemetrySample {
    metrics.iter().fold(
        TelemetrySample::new(machine_id, Utc.with_ymd_and_hms(2025, 11, 14, 8, 30, 0).unwrap()),
        |s, (name, value)| s.with_metric(*name, *value),
    )
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn five_readings_produce_expected_features() {
    let mut engine = FeatureEngine::new(5);
    let mut last = None;
    for v in [2.5, 3.0, 3.2, 4.5, 3.8] {
        last = Some(engine.compute_features(&sample("MILL-3", &[("vibration", v)])));
    }
    let features = last.expect("computed").features;

    assert_eq!(features.len(), 4);
    assert_close(features["vibration_sma"], 3.4);
    assert_close(features["vibration_derivative"], -0.7);
    assert_close(features["vibration_min"], 2.5);
    assert_close(features["vibration_max"], 4.5);
}

#[test]
fn window_evicts_oldest_reading_at_capacity() {
    let mut engine = FeatureEngine::new(3);
    for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
        engine.add_reading("TRUCK-21", "rpm", v);
    }
    assert_eq!(engine.window("TRUCK-21", "rpm"), Some(vec![3.0, 4.0, 5.0]));

    let features = engine
        .compute_features(&sample("TRUCK-21", &[("rpm", 9.0)]))
        .features;
    assert_close(features["rpm_min"], 4.0);
    assert_close(features["rpm_max"], 9.0);
    assert_close(features["rpm_sma"], 6.0);
}

#[test]
fn single_reading_has_zero_derivative() {
    let mut engine = FeatureEngine::default();
    let features = engine
        .compute_features(&sample("BOILER-7", &[("temperature", 181.37)]))
        .features;

    assert_close(features["temperature_sma"], 181.37);
    assert_close(features["temperature_derivative"], 0.0);
    assert_close(features["temperature_min"], 181.37);
    assert_close(features["temperature_max"], 181.37);
}

#[test]
fn empty_sample_yields_empty_feature_set() {
    let mut engine = FeatureEngine::default();
    let out = engine.compute_features(&sample("MILL-3", &[]));
    assert!(out.is_empty());
    assert_eq!(out.machine_id, "MILL-3");
    assert_eq!(engine.tracked_windows(), 0);
}

#[test]
fn machines_never_share_windows() {
    let mut engine = FeatureEngine::new(4);
    engine.compute_features(&sample("TRUCK-21", &[("vibration", 2.0)]));
    let other = engine.compute_features(&sample("MILL-3", &[("vibration", 5.0)]));

    assert_close(other.features["vibration_derivative"], 0.0);
    assert_eq!(engine.window("TRUCK-21", "vibration"), Some(vec![2.0]));
    assert_eq!(engine.window("MILL-3", "vibration"), Some(vec![5.0]));
    assert_eq!(engine.window("BOILER-7", "vibration"), None);
}

#[test]
fn every_metric_emits_four_features() {
    let mut engine = FeatureEngine::default();
    let out = engine.compute_features(&sample(
        "TRUCK-21",
        &[("rpm", 1650.0), ("temperature", 91.2), ("co2_ppm", 480.0)],
    ));

    assert_eq!(out.features.len(), 12);
    assert_eq!(engine.tracked_windows(), 3);
    for metric in ["rpm", "temperature", "co2_ppm"] {
        for suffix in ["sma", "derivative", "min", "max"] {
            assert!(out.features.contains_key(&format!("{metric}_{suffix}")));
        }
    }
}

#[test]
fn features_are_rounded_to_two_decimals() {
    let mut engine = FeatureEngine::new(3);
    engine.add_reading("MILL-3", "kwh", 1.0);
    engine.add_reading("MILL-3", "kwh", 1.0);
    let out = engine.compute_features(&sample("MILL-3", &[("kwh", 2.0)]));
    assert_close(out.features["kwh_sma"], 1.33);
}

#[test]
fn zero_window_size_is_clamped() {
    let mut engine = FeatureEngine::new(0);
    assert_eq!(engine.window_size(), 1);
    engine.add_reading("MILL-3", "rpm", 1.0);
    engine.add_reading("MILL-3", "rpm", 2.0);
    assert_eq!(engine.window("MILL-3", "rpm"), Some(vec![2.0]));
}

#[test]
fn rolling_window_reports_basic_statistics() {
    let mut window = RollingWindow::new(2);
    assert!(window.is_empty());
    assert_close(window.sma(), 0.0);
    assert_close(window.derivative(), 0.0);

    window.push(4.0);
    window.push(1.0);
    window.push(7.0);
    assert_eq!(window.len(), 2);
    assert_eq!(window.capacity(), 2);
    assert_close(window.sma(), 4.0);
    assert_close(window.derivative(), 6.0);
    assert_close(window.min(), 1.0);
    assert_close(window.max(), 7.0);
}
