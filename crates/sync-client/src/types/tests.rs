use super::*;
use chrono::TimeZone;

#[test]
fn payload_kind_labels_match_operation_names() {
    assert_eq!(PayloadKind::Raw.to_string(), "raw");
    assert_eq!(PayloadKind::Features.as_str(), "features");
}

#[test]
fn sample_serializes_with_rfc3339_timestamp() {
    let ts = Utc.with_ymd_and_hms(2025, 11, 14, 8, 30, 0).unwrap();
    let sample = TelemetrySample::new("TRUCK-21", ts)
        .with_metric("vibration", 3.5)
        .with_metric("rpm", 1500.0);

    let body = serde_json::to_value(&sample).expect("serialize sample");
    assert_eq!(body["machine_id"], "TRUCK-21");
    assert_eq!(body["timestamp"], "2025-11-14T08:30:00Z");
    assert_eq!(body["metrics"]["vibration"], 3.5);
    assert_eq!(body["metrics"]["rpm"], 1500.0);
}

#[test]
fn payload_reports_kind_and_machine() {
    let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let sample = TelemetrySample::new("MILL-3", ts);
    let features = FeatureSet::empty("BOILER-7", ts);

    assert_eq!(Payload::Raw(&sample).kind(), PayloadKind::Raw);
    assert_eq!(Payload::Raw(&sample).machine_id(), "MILL-3");
    assert_eq!(Payload::Features(&features).kind(), PayloadKind::Features);
    assert_eq!(Payload::Features(&features).machine_id(), "BOILER-7");
    assert!(features.is_empty());
}
