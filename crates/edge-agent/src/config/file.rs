use anyhow::{Context, Result};
use serde::Deserialize;

use super::constants::DEFAULT_BACKEND_PORT;
use super::paths::resolve_config_path;
use super::types::EdgeConfig;
use super::util::{format_backend_url, non_empty};

impl EdgeConfig {
    pub(super) fn apply_file_config(&mut self) -> Result<bool> {
        let path = resolve_config_path()?;
        let Some(path) = path else {
            return Ok(false);
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed reading config file {}", path.display()))?;
        let file_cfg: FileConfig = toml::from_str(&raw)
            .with_context(|| format!("failed parsing TOML config {}", path.display()))?;

        self.apply_file_agent(file_cfg.agent);
        self.apply_file_backend(file_cfg.backend);
        self.apply_file_buffer(file_cfg.buffer);
        self.apply_file_features(file_cfg.features);
        self.apply_file_sync(file_cfg.sync);
        self.apply_file_retry(file_cfg.retry);
        self.apply_file_circuit_breaker(file_cfg.circuit_breaker);
        self.apply_file_timeouts(file_cfg.timeouts);
        self.apply_file_simulator(file_cfg.simulator);
        self.apply_file_ingest(file_cfg.ingest);

        Ok(true)
    }

    fn apply_file_agent(&mut self, agent: Option<FileAgentConfig>) {
        let Some(agent) = agent else {
            return;
        };
        if let Some(v) = non_empty(agent.id) {
            self.agent_id = v;
        }
    }

    fn apply_file_backend(&mut self, backend: Option<FileBackendConfig>) {
        let Some(backend) = backend else {
            return;
        };

        if let Some(url) = non_empty(backend.url) {
            self.backend_url = url;
        } else if let Some(host) = non_empty(backend.host) {
            let port = backend.port.unwrap_or(DEFAULT_BACKEND_PORT);
            self.backend_url = format_backend_url(&host, Some(port));
        }
    }

    fn apply_file_buffer(&mut self, buffer: Option<FileBufferConfig>) {
        let Some(buffer) = buffer else {
            return;
        };
        if let Some(v) = buffer.capacity {
            self.buffer_capacity = v;
        }
    }

    fn apply_file_features(&mut self, features: Option<FileFeaturesConfig>) {
        let Some(features) = features else {
            return;
        };
        if let Some(v) = features.window_size {
            self.window_size = v;
        }
    }

    fn apply_file_sync(&mut self, sync: Option<FileSyncConfig>) {
        let Some(sync) = sync else {
            return;
        };
        if let Some(v) = sync.interval_secs {
            self.sync_interval_secs = v;
        }
    }

    fn apply_file_retry(&mut self, retry: Option<FileRetryConfig>) {
        let Some(retry) = retry else {
            return;
        };
        if let Some(v) = retry.max_attempts {
            self.retry_max_attempts = v;
        }
        if let Some(v) = retry.base_delay_ms {
            self.retry_base_delay_ms = v;
        }
        if let Some(v) = retry.max_delay_ms {
            self.retry_max_delay_ms = v;
        }
        if let Some(v) = retry.multiplier {
            self.retry_multiplier = v;
        }
    }

    fn apply_file_circuit_breaker(&mut self, breaker: Option<FileCircuitBreakerConfig>) {
        let Some(breaker) = breaker else {
            return;
        };
        if let Some(v) = breaker.fail_max {
            self.breaker_fail_max = v;
        }
        if let Some(v) = breaker.timeout_secs {
            self.breaker_timeout_secs = v;
        }
    }

    fn apply_file_timeouts(&mut self, timeouts: Option<FileTimeoutsConfig>) {
        let Some(timeouts) = timeouts else {
            return;
        };
        if let Some(v) = timeouts.connect_ms {
            self.timeout_connect_ms = v;
        }
        if let Some(v) = timeouts.read_ms {
            self.timeout_read_ms = v;
        }
        if let Some(v) = timeouts.write_ms {
            self.timeout_write_ms = v;
        }
        if let Some(v) = timeouts.pool_ms {
            self.timeout_pool_ms = v;
        }
    }

    fn apply_file_simulator(&mut self, simulator: Option<FileSimulatorConfig>) {
        let Some(simulator) = simulator else {
            return;
        };
        if let Some(v) = simulator.enabled {
            self.simulator_enabled = v;
        }
        if let Some(machines) = simulator.machines {
            let machines: Vec<String> = machines
                .into_iter()
                .filter_map(|m| non_empty(Some(m)))
                .map(|m| m.trim().to_string())
                .collect();
            if !machines.is_empty() {
                self.simulator_machines = machines;
            }
        }
        if let Some(v) = simulator.interval_ms {
            self.simulator_interval_ms = v;
        }
    }

    fn apply_file_ingest(&mut self, ingest: Option<FileIngestConfig>) {
        let Some(ingest) = ingest else {
            return;
        };
        if let Some(v) = ingest.enabled {
            self.ingest_enabled = v;
        }
        if let Some(v) = non_empty(ingest.listen_addr) {
            self.ingest_listen_addr = v.trim().to_string();
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    agent: Option<FileAgentConfig>,
    #[serde(default)]
    backend: Option<FileBackendConfig>,
    #[serde(default)]
    buffer: Option<FileBufferConfig>,
    #[serde(default)]
    features: Option<FileFeaturesConfig>,
    #[serde(default)]
    sync: Option<FileSyncConfig>,
    #[serde(default)]
    retry: Option<FileRetryConfig>,
    #[serde(default)]
    circuit_breaker: Option<FileCircuitBreakerConfig>,
    #[serde(default)]
    timeouts: Option<FileTimeoutsConfig>,
    #[serde(default)]
    simulator: Option<FileSimulatorConfig>,
    #[serde(default)]
    ingest: Option<FileIngestConfig>,
}

#[derive(Debug, Deserialize)]
struct FileAgentConfig {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileBackendConfig {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct FileBufferConfig {
    #[serde(default)]
    capacity: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct FileFeaturesConfig {
    #[serde(default)]
    window_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct FileSyncConfig {
    #[serde(default)]
    interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FileRetryConfig {
    #[serde(default)]
    max_attempts: Option<u32>,
    #[serde(default)]
    base_delay_ms: Option<u64>,
    #[serde(default)]
    max_delay_ms: Option<u64>,
    #[serde(default)]
    multiplier: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FileCircuitBreakerConfig {
    #[serde(default)]
    fail_max: Option<u32>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FileTimeoutsConfig {
    #[serde(default)]
    connect_ms: Option<u64>,
    #[serde(default)]
    read_ms: Option<u64>,
    #[serde(default)]
    write_ms: Option<u64>,
    #[serde(default)]
    pool_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FileSimulatorConfig {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    machines: Option<Vec<String>>,
    #[serde(default)]
    interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FileIngestConfig {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    listen_addr: Option<String>,
}
