//! Process configuration from `TILL_*` environment variables.
//!
//! Unset or unparseable variables fall back to their defaults. CLI flags are
//! applied on top by the binary.

use std::path::PathBuf;
use std::time::Duration;

use crate::channel::relay::RelayClient;
use crate::connection::ConnectionConfig;
use crate::connection::radio::{DEFAULT_NAME_PREFIXES, DeviceFilter};
use crate::error::TillError;
use crate::server::RelayConfig;
use crate::transport::ChunkPolicy;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Target printer name; also the relay's CUPS queue
    pub printer: String,
    /// Device file for raw copy on the relay
    pub device: Option<PathBuf>,
    pub relay_url: String,
    pub relay_fallback_urls: Vec<String>,
    pub environment: String,
    /// Log receipts instead of printing them
    pub simulate: bool,
    pub listen_addr: String,
    pub connect_timeout_ms: u64,
    pub relay_timeout_ms: u64,
    pub name_prefixes: Vec<String>,
    pub chunk_size: usize,
    pub chunk_delay_ms: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("TILL_ENV").unwrap_or_else(|| "development".into());
        let production = environment == "production";

        Self {
            printer: lookup("TILL_PRINTER").unwrap_or_else(|| "POS-80".into()),
            device: lookup("TILL_DEVICE")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
            relay_url: lookup("TILL_RELAY_URL")
                .unwrap_or_else(|| "http://localhost:3001".into()),
            relay_fallback_urls: lookup("TILL_RELAY_FALLBACK_URLS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            simulate: lookup("TILL_SIMULATE")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(!production),
            environment,
            listen_addr: lookup("TILL_LISTEN").unwrap_or_else(|| "0.0.0.0:3001".into()),
            connect_timeout_ms: lookup("TILL_CONNECT_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            relay_timeout_ms: lookup("TILL_RELAY_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000),
            name_prefixes: lookup("TILL_NAME_PREFIXES")
                .map(|v| split_list(&v))
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_NAME_PREFIXES.iter().map(|p| p.to_string()).collect()),
            chunk_size: lookup("TILL_CHUNK_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            chunk_delay_ms: lookup("TILL_CHUNK_DELAY_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        let defaults = ConnectionConfig::default();
        ConnectionConfig {
            filter: DeviceFilter {
                name_prefixes: self.name_prefixes.clone(),
                ..defaults.filter
            },
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            chunk_policy: ChunkPolicy::new(
                self.chunk_size,
                Duration::from_millis(self.chunk_delay_ms),
            ),
            ..defaults
        }
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            listen_addr: self.listen_addr.clone(),
            printer: self.printer.clone(),
            device: self.device.clone(),
            simulate: self.simulate,
            environment: self.environment.clone(),
        }
    }

    pub fn relay_client(&self) -> Result<RelayClient, TillError> {
        Ok(
            RelayClient::new(&self.relay_url, Duration::from_millis(self.relay_timeout_ms))?
                .with_fallback_urls(&self.relay_fallback_urls),
        )
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
