use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::types::{FeatureSet, TelemetrySample};

use super::{SinkError, UpstreamSink};

pub const PATH_RAW: &str = "/ingest/raw";
pub const PATH_FEATURES: &str = "/ingest/features";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub connect: Duration,
    pub read: Duration,
    pub write: Duration,
    pub pool: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            read: Duration::from_secs(30),
            write: Duration::from_secs(30),
            pool: Duration::from_secs(5),
        }
    }
}

impl TimeoutConfig {
    /// reqwest has no separate write phase, so the whole request is bounded
    /// by read + write.
    pub fn request_total(&self) -> Duration {
        self.read.saturating_add(self.write)
    }
}

/// JSON-over-HTTP sink posting to `{backend}/ingest/raw` and
/// `{backend}/ingest/features`.
#[derive(Debug, Clone)]
pub struct HttpSink {
    backend_url: String,
    http: reqwest::Client,
}

impl HttpSink {
    pub fn new(backend_url: impl Into<String>, timeouts: TimeoutConfig) -> Result<Self> {
        let backend_url = backend_url.into();
        if backend_url.trim().is_empty() {
            anyhow::bail!("backend url cannot be empty");
        }

        let http = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .timeout(timeouts.request_total())
            .pool_idle_timeout(timeouts.pool)
            .build()
            .context("failed building HTTP client for backend sink")?;

        Ok(Self { backend_url, http })
    }

    fn url_for_base(&self) -> String {
        let base = self.backend_url.trim();
        if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            format!("http://{}", base)
        }
    }

    pub(crate) fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.url_for_base().trim_end_matches('/'), path)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<(), SinkError> {
        let url = self.url_for(path);
        let body = serde_json::to_vec(payload).map_err(|err| SinkError::Encode(err.to_string()))?;

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "backend returned error status");
            return Err(SinkError::Status {
                code: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl UpstreamSink for HttpSink {
    async fn send_raw(&self, sample: &TelemetrySample) -> Result<(), SinkError> {
        self.post_json(PATH_RAW, sample).await
    }

    async fn send_features(&self, features: &FeatureSet) -> Result<(), SinkError> {
        self.post_json(PATH_FEATURES, features).await
    }
}

fn classify_transport_error(err: reqwest::Error) -> SinkError {
    if err.is_timeout() {
        return SinkError::Timeout(err.to_string());
    }
    if let Some(status) = err.status() {
        return SinkError::Status {
            code: status.as_u16(),
        };
    }
    if err.is_builder() {
        return SinkError::Encode(err.to_string());
    }
    SinkError::Transport(err.to_string())
}
