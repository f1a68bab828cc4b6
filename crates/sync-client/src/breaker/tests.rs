use super::*;
use std::sync::atomic::AtomicU32;

use tokio::time::advance;

#[derive(Default)]
struct RecordingListener {
    transitions: Mutex<Vec<(CircuitState, CircuitState)>>,
}

impl StateListener for RecordingListener {
    fn on_state_change(&self, transition: &StateTransition) {
        self.transitions
            .lock()
            .expect("transitions lock")
            .push((transition.from, transition.to));
    }
}

fn breaker(fail_max: u32, timeout_secs: u64) -> CircuitBreaker {
    CircuitBreaker::new(
        "backend_api",
        BreakerConfig {
            fail_max,
            timeout: Duration::from_secs(timeout_secs),
        },
    )
}

async fn fail(b: &CircuitBreaker) -> Result<(), BreakerError<&'static str>> {
    b.call(|| async { Err::<(), _>("connect refused") }).await
}

async fn succeed(b: &CircuitBreaker) -> Result<u32, BreakerError<&'static str>> {
    b.call(|| async { Ok::<_, &'static str>(7) }).await
}

#[tokio::test(start_paused = true)]
async fn breaker_opens_after_fail_max_consecutive_failures() {
    let b = breaker(3, 60);
    for expected in 1..=2 {
        assert!(matches!(fail(&b).await, Err(BreakerError::Inner(_))));
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.consecutive_failures(), expected);
    }

    assert!(matches!(fail(&b).await, Err(BreakerError::Inner(_))));
    assert_eq!(b.state(), CircuitState::Open);
    assert_eq!(b.consecutive_failures(), 3);
}

#[tokio::test(start_paused = true)]
async fn success_resets_consecutive_failure_counter() {
    let b = breaker(3, 60);
    fail(&b).await.expect_err("fail");
    fail(&b).await.expect_err("fail");
    assert_eq!(succeed(&b).await.expect("success"), 7);
    assert_eq!(b.consecutive_failures(), 0);

    fail(&b).await.expect_err("fail");
    fail(&b).await.expect_err("fail");
    assert_eq!(b.state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn open_breaker_rejects_without_invoking_operation() {
    let b = breaker(1, 60);
    fail(&b).await.expect_err("trip");
    assert_eq!(b.state(), CircuitState::Open);

    let invoked = AtomicU32::new(0);
    advance(Duration::from_secs(59)).await;
    let err = b
        .call(|| {
            invoked.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, &'static str>(()) }
        })
        .await
        .expect_err("open breaker must reject");

    assert!(err.is_open());
    assert!(err.to_string().contains("backend_api"));
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
    assert_eq!(b.rejected_count(), 1);
    assert_eq!(b.state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn successful_probe_after_timeout_closes_breaker() {
    let listener = Arc::new(RecordingListener::default());
    let b = breaker(2, 30).with_listener(listener.clone());
    fail(&b).await.expect_err("fail");
    fail(&b).await.expect_err("trip");

    advance(Duration::from_secs(30)).await;
    assert_eq!(succeed(&b).await.expect("probe succeeds"), 7);
    assert_eq!(b.state(), CircuitState::Closed);
    assert_eq!(b.consecutive_failures(), 0);

    let transitions = listener.transitions.lock().expect("transitions lock").clone();
    assert_eq!(
        transitions,
        vec![
            (CircuitState::Closed, CircuitState::Open),
            (CircuitState::Open, CircuitState::HalfOpen),
            (CircuitState::HalfOpen, CircuitState::Closed),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_probe_reopens_and_restarts_timer() {
    let b = breaker(1, 10);
    fail(&b).await.expect_err("trip");

    advance(Duration::from_secs(10)).await;
    assert!(matches!(fail(&b).await, Err(BreakerError::Inner(_))));
    assert_eq!(b.state(), CircuitState::Open);

    advance(Duration::from_secs(5)).await;
    assert!(fail(&b).await.expect_err("still open").is_open());

    advance(Duration::from_secs(5)).await;
    assert_eq!(succeed(&b).await.expect("second probe"), 7);
    assert_eq!(b.state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn half_open_admits_exactly_one_probe() {
    let b = Arc::new(breaker(1, 5));
    fail(&b).await.expect_err("trip");
    advance(Duration::from_secs(5)).await;

    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
    let probe_breaker = Arc::clone(&b);
    let probe = tokio::spawn(async move {
        probe_breaker
            .call(|| async move {
                let _ = release_rx.await;
                Ok::<_, &'static str>(1u32)
            })
            .await
    });
    tokio::task::yield_now().await;
    assert_eq!(b.state(), CircuitState::HalfOpen);

    let concurrent = succeed(&b).await.expect_err("second caller rejected");
    assert!(concurrent.is_open());

    release_tx.send(()).expect("release probe");
    assert_eq!(probe.await.expect("join").expect("probe ok"), 1);
    assert_eq!(b.state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn dropped_probe_counts_as_failure() {
    let b = breaker(1, 5);
    fail(&b).await.expect_err("trip");
    advance(Duration::from_secs(5)).await;

    let pending = b.call(|| std::future::pending::<Result<(), &'static str>>());
    let timed_out = tokio::time::timeout(Duration::from_secs(1), pending).await;
    assert!(timed_out.is_err());
    assert_eq!(b.state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn filtered_errors_do_not_trip_breaker() {
    let b = breaker(2, 60);
    for _ in 0..5 {
        let result = b
            .call_filtered(|| async { Err::<(), _>("422 rejected") }, |_| false)
            .await;
        assert!(matches!(result, Err(BreakerError::Inner("422 rejected"))));
    }
    assert_eq!(b.state(), CircuitState::Closed);
    assert_eq!(b.consecutive_failures(), 0);
}

#[test]
fn snapshot_reports_current_state() {
    let b = breaker(4, 60);
    let snap = b.snapshot();
    assert_eq!(snap.name, "backend_api");
    assert_eq!(snap.state, CircuitState::Closed);
    assert_eq!(snap.fail_max, 4);
    assert_eq!(snap.rejected, 0);
    assert_eq!(CircuitState::HalfOpen.to_string(), "half_open");
}
