use tracing::warn;

use super::constants::DEFAULT_BACKEND_PORT;
use super::types::EdgeConfig;
use super::util::{env_non_empty, env_parse, format_backend_url, parse_bool, split_csv};

impl EdgeConfig {
    pub(super) fn apply_env_overrides(&mut self) {
        self.apply_env_agent_identity();
        self.apply_env_backend();
        self.apply_env_pipeline();
        self.apply_env_retry();
        self.apply_env_circuit_breaker();
        self.apply_env_timeouts();
        self.apply_env_simulator();
        self.apply_env_ingest();
    }

    fn apply_env_agent_identity(&mut self) {
        if let Some(v) = env_non_empty("EDGE_AGENT_ID") {
            self.agent_id = v;
        }
    }

    fn apply_env_backend(&mut self) {
        if let Some(v) = env_non_empty("EDGE_BACKEND_URL") {
            self.backend_url = v;
            return;
        }
        if let Some(host) = env_non_empty("EDGE_BACKEND_HOST") {
            let port = env_parse::<u16>("EDGE_BACKEND_PORT").unwrap_or(DEFAULT_BACKEND_PORT);
            self.backend_url = format_backend_url(&host, Some(port));
        }
    }

    fn apply_env_pipeline(&mut self) {
        if let Some(v) = env_parse::<usize>("EDGE_BUFFER_CAPACITY") {
            self.buffer_capacity = v;
        }
        if let Some(v) = env_parse::<usize>("EDGE_WINDOW_SIZE") {
            self.window_size = v;
        }
        if let Some(v) = env_parse::<u64>("EDGE_SYNC_INTERVAL_SECS") {
            self.sync_interval_secs = v;
        }
    }

    fn apply_env_retry(&mut self) {
        if let Some(v) = env_parse::<u32>("EDGE_RETRY_MAX_ATTEMPTS") {
            self.retry_max_attempts = v;
        }
        if let Some(v) = env_parse::<u64>("EDGE_RETRY_BASE_DELAY_MS") {
            self.retry_base_delay_ms = v;
        }
        if let Some(v) = env_parse::<u64>("EDGE_RETRY_MAX_DELAY_MS") {
            self.retry_max_delay_ms = v;
        }
        if let Some(v) = env_parse::<f64>("EDGE_RETRY_MULTIPLIER") {
            self.retry_multiplier = v;
        }
    }

    fn apply_env_circuit_breaker(&mut self) {
        if let Some(v) = env_parse::<u32>("EDGE_BREAKER_FAIL_MAX") {
            self.breaker_fail_max = v;
        }
        if let Some(v) = env_parse::<u64>("EDGE_BREAKER_TIMEOUT_SECS") {
            self.breaker_timeout_secs = v;
        }
    }

    fn apply_env_timeouts(&mut self) {
        if let Some(v) = env_parse::<u64>("EDGE_TIMEOUT_CONNECT_MS") {
            self.timeout_connect_ms = v;
        }
        if let Some(v) = env_parse::<u64>("EDGE_TIMEOUT_READ_MS") {
            self.timeout_read_ms = v;
        }
        if let Some(v) = env_parse::<u64>("EDGE_TIMEOUT_WRITE_MS") {
            self.timeout_write_ms = v;
        }
        if let Some(v) = env_parse::<u64>("EDGE_TIMEOUT_POOL_MS") {
            self.timeout_pool_ms = v;
        }
    }

    fn apply_env_simulator(&mut self) {
        if let Some(raw) = env_non_empty("EDGE_SIMULATOR_ENABLED") {
            match parse_bool(&raw) {
                Some(v) => self.simulator_enabled = v,
                None => warn!(
                    var = "EDGE_SIMULATOR_ENABLED",
                    value = %raw,
                    "ignoring unparseable environment override"
                ),
            }
        }
        if let Some(raw) = env_non_empty("EDGE_SIMULATOR_MACHINES") {
            let machines = split_csv(&raw);
            if !machines.is_empty() {
                self.simulator_machines = machines;
            }
        }
        if let Some(v) = env_parse::<u64>("EDGE_SIMULATOR_INTERVAL_MS") {
            self.simulator_interval_ms = v;
        }
    }

    fn apply_env_ingest(&mut self) {
        if let Some(raw) = env_non_empty("EDGE_INGEST_ENABLED") {
            match parse_bool(&raw) {
                Some(v) => self.ingest_enabled = v,
                None => warn!(
                    var = "EDGE_INGEST_ENABLED",
                    value = %raw,
                    "ignoring unparseable environment override"
                ),
            }
        }
        if let Some(v) = env_non_empty("EDGE_INGEST_ADDR") {
            self.ingest_listen_addr = v.trim().to_string();
        }
    }
}
