//! HTTP intake for field telemetry.
//!
//! `POST /iot/raw` accepts one [`TelemetrySample`] as JSON and offers it to
//! the shared buffer; `GET /` reports health together with the pipeline
//! snapshot.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use sync_client::{TelemetryBuffer, TelemetrySample};

use crate::lifecycle::{PipelineObserver, PipelineSnapshot};

pub const PATH_HEALTH: &str = "/";
pub const PATH_INGEST_RAW: &str = "/iot/raw";

const COMPONENT: &str = "edge-agent";

#[derive(Debug, Clone)]
pub struct IngestState {
    agent_id: Arc<str>,
    buffer: Arc<TelemetryBuffer>,
    observer: PipelineObserver,
}

impl IngestState {
    pub fn new(
        agent_id: impl Into<Arc<str>>,
        buffer: Arc<TelemetryBuffer>,
        observer: PipelineObserver,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            buffer,
            observer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    Accepted,
    Dropped,
    Invalid,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: IngestStatus,
    pub message: String,
    pub buffer_size: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub component: &'static str,
    pub agent_id: String,
    pub buffer_size: usize,
    pub pipeline: PipelineSnapshot,
}

pub fn router(state: IngestState) -> Router {
    Router::new()
        .route(PATH_HEALTH, get(handle_health))
        .route(PATH_INGEST_RAW, post(handle_raw))
        .with_state(state)
}

async fn handle_health(State(state): State<IngestState>) -> Json<HealthResponse> {
    let pipeline = state.observer.snapshot();
    Json(HealthResponse {
        status: "ok",
        component: COMPONENT,
        agent_id: state.agent_id.to_string(),
        buffer_size: pipeline.buffer_size,
        pipeline,
    })
}

/// 200 when buffered, 503 when the buffer is full, 4xx for bodies that are
/// not a usable sample.
async fn handle_raw(
    State(state): State<IngestState>,
    payload: Result<Json<TelemetrySample>, JsonRejection>,
) -> (StatusCode, Json<IngestResponse>) {
    let sample = match payload {
        Ok(Json(sample)) => sample,
        Err(rejection) => {
            let message = rejection.body_text();
            debug!(error = %message, "rejected malformed telemetry");
            return respond(&state, rejection.status(), IngestStatus::Invalid, message);
        }
    };

    if sample.machine_id.trim().is_empty() {
        return respond(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            IngestStatus::Invalid,
            "machine_id cannot be empty",
        );
    }

    let machine_id = sample.machine_id.clone();
    if state.buffer.try_add(sample) {
        respond(&state, StatusCode::OK, IngestStatus::Accepted, "buffered at edge")
    } else {
        debug!(%machine_id, "edge buffer full, telemetry dropped");
        respond(
            &state,
            StatusCode::SERVICE_UNAVAILABLE,
            IngestStatus::Dropped,
            "edge buffer full",
        )
    }
}

fn respond(
    state: &IngestState,
    code: StatusCode,
    status: IngestStatus,
    message: impl Into<String>,
) -> (StatusCode, Json<IngestResponse>) {
    (
        code,
        Json(IngestResponse {
            status,
            message: message.into(),
            buffer_size: state.buffer.size(),
        }),
    )
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed binding ingest listener on {addr}"))
}

/// Serves the intake routes until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    state: IngestState,
    cancel: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr().context("ingest listener has no local address")?;
    info!(address = %addr, "ingest server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("ingest server failed")?;

    info!("ingest server stopped");
    Ok(())
}
