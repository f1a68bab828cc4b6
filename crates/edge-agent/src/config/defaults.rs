use feature_engine::DEFAULT_WINDOW_SIZE;
use sync_client::{BreakerConfig, RetryPolicy, TimeoutConfig, DEFAULT_BUFFER_CAPACITY};

use super::constants::{
    DEFAULT_BACKEND_HOST, DEFAULT_BACKEND_PORT, DEFAULT_INGEST_LISTEN_ADDR, DEFAULT_SIMULATOR_INTERVAL_MS,
    DEFAULT_SIMULATOR_MACHINES, DEFAULT_SYNC_INTERVAL_SECS,
};
use super::types::EdgeConfig;
use super::util::{default_agent_id, duration_millis, format_backend_url};

impl Default for EdgeConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        let breaker = BreakerConfig::default();
        let timeouts = TimeoutConfig::default();

        Self {
            agent_id: default_agent_id(),
            backend_url: format_backend_url(DEFAULT_BACKEND_HOST, Some(DEFAULT_BACKEND_PORT)),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            window_size: DEFAULT_WINDOW_SIZE,
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            retry_max_attempts: retry.max_attempts,
            retry_base_delay_ms: duration_millis(retry.base_delay),
            retry_max_delay_ms: duration_millis(retry.max_delay),
            retry_multiplier: retry.multiplier,
            breaker_fail_max: breaker.fail_max,
            breaker_timeout_secs: breaker.timeout.as_secs(),
            timeout_connect_ms: duration_millis(timeouts.connect),
            timeout_read_ms: duration_millis(timeouts.read),
            timeout_write_ms: duration_millis(timeouts.write),
            timeout_pool_ms: duration_millis(timeouts.pool),
            simulator_enabled: true,
            simulator_machines: DEFAULT_SIMULATOR_MACHINES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            simulator_interval_ms: DEFAULT_SIMULATOR_INTERVAL_MS,
            ingest_enabled: true,
            ingest_listen_addr: DEFAULT_INGEST_LISTEN_ADDR.to_string(),
        }
    }
}
