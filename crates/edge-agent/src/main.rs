mod config;
mod ingest;
mod lifecycle;
mod simulator;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use feature_engine::FeatureEngine;
use sync_client::{CircuitBreaker, ForwardingClient, HttpSink, TelemetryBuffer};

use config::EdgeConfig;
use ingest::IngestState;
use lifecycle::PipelineDriver;
use simulator::{run_simulator, SensorSimulator};

const BACKEND_BREAKER_NAME: &str = "backend_api";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EdgeConfig::load()?;

    let buffer = Arc::new(TelemetryBuffer::new(config.buffer_capacity));
    let sink = HttpSink::new(config.backend_url.clone(), config.timeout_config())
        .context("failed initializing backend sink")?;
    let breaker = Arc::new(CircuitBreaker::new(
        BACKEND_BREAKER_NAME,
        config.breaker_config(),
    ));
    let client = ForwardingClient::new(Arc::new(sink), config.retry_policy(), breaker);
    let driver = PipelineDriver::new(
        Arc::clone(&buffer),
        FeatureEngine::new(config.window_size),
        client,
        config.sync_interval(),
    );
    let observer = driver.observer();

    info!(
        agent_id = %config.agent_id,
        backend = %config.backend_url,
        buffer_capacity = config.buffer_capacity,
        window_size = config.window_size,
        sync_interval_secs = config.sync_interval_secs,
        simulator = config.simulator_enabled,
        ingest = config.ingest_enabled,
        "edge-agent started"
    );

    let cancel = CancellationToken::new();
    let ingest_task = if config.ingest_enabled {
        let listener = ingest::bind(config.ingest_addr()?).await?;
        let state = IngestState::new(
            config.agent_id.as_str(),
            Arc::clone(&buffer),
            observer.clone(),
        );
        Some(tokio::spawn(ingest::serve(listener, state, cancel.clone())))
    } else {
        None
    };
    let driver_task = tokio::spawn(driver.run(cancel.clone()));
    let simulator_task = config.simulator_enabled.then(|| {
        let simulator = SensorSimulator::new(&config.simulator_machines);
        tokio::spawn(run_simulator(
            simulator,
            Arc::clone(&buffer),
            config.simulator_interval(),
            cancel.clone(),
        ))
    });

    signal::ctrl_c()
        .await
        .context("failed listening for shutdown signal")?;
    info!("shutdown signal received");
    cancel.cancel();

    if let Some(task) = ingest_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "ingest server failed"),
            Err(err) => warn!(error = %err, "ingest task failed"),
        }
    }
    if let Some(task) = simulator_task {
        if let Err(err) = task.await {
            warn!(error = %err, "simulator task failed");
        }
    }
    let totals = driver_task.await.context("pipeline driver task failed")?;

    let snapshot = observer.snapshot();
    info!(
        processed = totals.processed,
        synced = totals.succeeded,
        failed = totals.failed,
        success_rate_pct = totals.success_rate(),
        buffer_dropped = snapshot.buffer_dropped,
        pending = snapshot.buffer_size,
        breaker_state = %snapshot.breaker.state,
        "edge-agent stopped"
    );
    Ok(())
}
