//! Prometheus metrics.
//!
//! The transfer engines record through the `metrics` facade; without an
//! installed recorder those calls are no-ops.

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Returns the listener address for `settings`, applying the
/// `PRICING_TRANSFER_METRICS_ENABLED` and `PRICING_TRANSFER_METRICS_PORT`
/// overrides. `None` when metrics are disabled.
#[must_use]
pub fn listen_addr(settings: &MetricsSettings) -> Option<SocketAddr> {
    let enabled = parse_bool_env("PRICING_TRANSFER_METRICS_ENABLED").unwrap_or(settings.enabled);
    let port = parse_port_env("PRICING_TRANSFER_METRICS_PORT").unwrap_or(settings.port);
    enabled.then(|| SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))
}

/// Installs the Prometheus recorder with an HTTP scrape listener.
///
/// Returns the bound address, or `None` when metrics are disabled. The
/// exporter runs on its own background thread.
pub fn install_prometheus(settings: &MetricsSettings) -> Result<Option<SocketAddr>> {
    let Some(addr) = listen_addr(settings) else {
        return Ok(None);
    };

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| Error::OperationFailed {
            operation: "metrics_exporter_install".to_string(),
            cause: e.to_string(),
        })?;

    Ok(Some(addr))
}

fn parse_bool_env(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|value| parse_bool(&value))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_port_env(key: &str) -> Option<u16> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
}
