use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use super::constants::DEFAULT_AGENT_ID;

pub(super) fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

pub(super) fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| non_empty(Some(v)))
}

/// Reads and parses an override; a value that does not parse is ignored.
pub(super) fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = env_non_empty(name)?;
    match raw.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

pub(super) fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .collect()
}

pub(super) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "enabled" | "on" => Some(true),
        "0" | "false" | "no" | "disabled" | "off" => Some(false),
        _ => None,
    }
}

pub(super) fn default_agent_id() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_AGENT_ID.to_string())
}

/// Builds a backend base URL. A port already present in `host` wins over
/// `port`; bare IPv6 hosts are bracketed.
pub(super) fn format_backend_url(host: &str, port: Option<u16>) -> String {
    let host = host.trim().trim_end_matches('/');
    let (scheme, rest) = host.split_once("://").unwrap_or(("http", host));
    let (authority, path) = rest.find('/').map_or((rest, ""), |idx| rest.split_at(idx));

    let authority = match port {
        Some(port) if !has_explicit_port(authority) => {
            if authority.contains(':') && !authority.starts_with('[') {
                format!("[{}]:{}", authority, port)
            } else {
                format!("{}:{}", authority, port)
            }
        }
        _ => authority.to_string(),
    };
    format!("{}://{}{}", scheme, authority, path)
}

pub(super) fn has_explicit_port(authority: &str) -> bool {
    if authority.starts_with('[') {
        return authority.contains("]:");
    }

    if authority.matches(':').count() == 1 {
        return authority
            .rsplit_once(':')
            .and_then(|(_, p)| p.parse::<u16>().ok())
            .is_some();
    }

    false
}

pub(super) fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
