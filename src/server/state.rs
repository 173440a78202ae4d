//! Relay configuration and shared handler state.

use std::path::PathBuf;

use crate::encoder::Encoder;

use super::spool::Spooler;

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address to listen on (e.g., "0.0.0.0:3001")
    pub listen_addr: String,
    /// Local printer queue name (e.g., "POS-80")
    pub printer: String,
    /// Raw device file; `None` means `/dev/usb/lp0`
    pub device: Option<PathBuf>,
    /// Log receipts instead of printing them
    pub simulate: bool,
    /// Deployment environment name, reported by `/printer/status`
    pub environment: String,
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: RelayConfig,
    pub spooler: Spooler,
    pub encoder: Encoder,
}

impl AppState {
    pub fn new(config: RelayConfig, spooler: Spooler) -> Self {
        Self {
            config,
            spooler,
            encoder: Encoder::default(),
        }
    }
}
