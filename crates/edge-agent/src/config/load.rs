use anyhow::{bail, Result};

use super::types::EdgeConfig;

impl EdgeConfig {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_file_config()?;
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend_url.trim().is_empty() {
            bail!("backend url cannot be empty");
        }
        if self.buffer_capacity == 0 {
            bail!("buffer capacity must be greater than zero");
        }
        if self.window_size == 0 {
            bail!("feature window size must be greater than zero");
        }
        if self.sync_interval_secs == 0 {
            bail!("sync interval must be greater than zero");
        }
        if self.retry_max_attempts == 0 {
            bail!("retry max_attempts must be at least 1");
        }
        if self.retry_multiplier.is_nan() || self.retry_multiplier < 1.0 {
            bail!(
                "retry multiplier must be >= 1.0, got {}",
                self.retry_multiplier
            );
        }
        if self.breaker_fail_max == 0 {
            bail!("circuit breaker fail_max must be greater than zero");
        }
        if self.simulator_enabled && self.simulator_interval_ms == 0 {
            bail!("simulator interval must be greater than zero");
        }
        if self.ingest_enabled {
            self.ingest_addr()?;
        }
        Ok(())
    }
}
