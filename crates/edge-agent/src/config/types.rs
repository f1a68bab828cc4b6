use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

use sync_client::{BreakerConfig, RetryPolicy, TimeoutConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeConfig {
    pub agent_id: String,
    pub backend_url: String,
    pub buffer_capacity: usize,
    pub window_size: usize,
    pub sync_interval_secs: u64,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_multiplier: f64,
    pub breaker_fail_max: u32,
    pub breaker_timeout_secs: u64,
    pub timeout_connect_ms: u64,
    pub timeout_read_ms: u64,
    pub timeout_write_ms: u64,
    pub timeout_pool_ms: u64,
    pub simulator_enabled: bool,
    pub simulator_machines: Vec<String>,
    pub simulator_interval_ms: u64,
    pub ingest_enabled: bool,
    pub ingest_listen_addr: String,
}

impl EdgeConfig {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn simulator_interval(&self) -> Duration {
        Duration::from_millis(self.simulator_interval_ms)
    }

    pub fn ingest_addr(&self) -> Result<SocketAddr> {
        self.ingest_listen_addr
            .trim()
            .parse()
            .with_context(|| format!("invalid ingest listen address '{}'", self.ingest_listen_addr))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            multiplier: self.retry_multiplier,
            max_attempts: self.retry_max_attempts,
        }
    }

    pub fn breaker_config(&self) -> BreakerConfig {
        BreakerConfig {
            fail_max: self.breaker_fail_max,
            timeout: Duration::from_secs(self.breaker_timeout_secs),
        }
    }

    pub fn timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig {
            connect: Duration::from_millis(self.timeout_connect_ms),
            read: Duration::from_millis(self.timeout_read_ms),
            write: Duration::from_millis(self.timeout_write_ms),
            pool: Duration::from_millis(self.timeout_pool_ms),
        }
    }
}
