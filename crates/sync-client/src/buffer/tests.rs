use super::*;
use std::sync::Arc;

use chrono::{TimeZone, Utc};

fn sample(i: i64) -> TelemetrySample {
    TelemetrySample::new("TRUCK-21", Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap())
        .with_metric("vibration", i as f64)
}

#[test]
fn buffer_accepts_exactly_capacity_then_drops_newest() {
    let b = TelemetryBuffer::new(3);
    let results: Vec<bool> = (0..6).map(|i| b.try_add(sample(i))).collect();

    assert_eq!(results, vec![true, true, true, false, false, false]);
    assert_eq!(b.size(), 3);
    assert_eq!(b.accepted_count(), 3);
    assert_eq!(b.dropped_count(), 3);

    let kept: Vec<f64> = b
        .drain_all()
        .into_iter()
        .map(|s| s.metrics["vibration"])
        .collect();
    assert_eq!(kept, vec![0.0, 1.0, 2.0]);
}

#[test]
fn drain_all_preserves_fifo_order_and_empties_buffer() {
    let b = TelemetryBuffer::new(16);
    for i in 1..=5 {
        assert!(b.try_add(sample(i)));
    }

    let out = b.drain_all();
    assert_eq!(b.size(), 0);
    assert!(b.is_empty());
    assert_eq!(out.len(), 5);
    let order: Vec<i64> = out.iter().map(|s| s.timestamp.timestamp()).collect();
    assert_eq!(
        order,
        (1..=5).map(|i| 1_700_000_000 + i).collect::<Vec<_>>()
    );
}

#[test]
fn drain_on_empty_buffer_returns_nothing() {
    let b = TelemetryBuffer::default();
    assert!(b.drain_all().is_empty());
    assert_eq!(b.capacity(), DEFAULT_BUFFER_CAPACITY);
}

#[test]
fn buffer_accepts_again_after_drain() {
    let b = TelemetryBuffer::new(1);
    assert!(b.try_add(sample(1)));
    assert!(!b.try_add(sample(2)));
    assert_eq!(b.drain_all().len(), 1);
    assert!(b.try_add(sample(3)));
    assert_eq!(b.size(), 1);
}

#[test]
fn zero_capacity_buffer_rejects_everything() {
    let b = TelemetryBuffer::new(0);
    assert!(!b.try_add(sample(1)));
    assert_eq!(b.size(), 0);
    assert_eq!(b.dropped_count(), 1);
}

#[test]
fn concurrent_producers_never_exceed_capacity() {
    let b = Arc::new(TelemetryBuffer::new(50));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let b = Arc::clone(&b);
            std::thread::spawn(move || {
                let mut accepted = 0usize;
                for i in 0..25 {
                    if b.try_add(sample(t * 100 + i)) {
                        accepted += 1;
                    }
                    assert!(b.size() <= 50);
                }
                accepted
            })
        })
        .collect();

    let accepted: usize = handles
        .into_iter()
        .map(|h| h.join().expect("producer thread"))
        .sum();
    assert_eq!(accepted, 50);
    assert_eq!(b.size(), 50);
    assert_eq!(b.dropped_count(), 150);
}
