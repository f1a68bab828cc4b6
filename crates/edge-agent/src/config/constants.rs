pub(super) const CONFIG_PATH_ENV: &str = "EDGE_AGENT_CONFIG";

pub(super) const AGENT_CONFIG_CANDIDATES: [&str; 2] =
    ["/etc/edge-agent/agent.toml", "./edge-agent.toml"];

pub(super) const DEFAULT_BACKEND_HOST: &str = "localhost";
pub(super) const DEFAULT_BACKEND_PORT: u16 = 8000;
pub(super) const DEFAULT_AGENT_ID: &str = "edge-agent-1";

pub(super) const DEFAULT_INGEST_LISTEN_ADDR: &str = "0.0.0.0:9000";

pub(super) const DEFAULT_SYNC_INTERVAL_SECS: u64 = 5;
pub(super) const DEFAULT_SIMULATOR_INTERVAL_MS: u64 = 3_000;
pub(super) const DEFAULT_SIMULATOR_MACHINES: [&str; 3] = ["TRUCK-21", "MILL-3", "BOILER-7"];
