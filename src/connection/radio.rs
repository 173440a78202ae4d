//! Device-facing traits for the wireless stack.
//!
//! A [`Radio`] finds printers and opens links to them; a [`Link`] is one
//! open connection with a write endpoint. The Linux implementation lives in
//! [`crate::transport::bluetooth`]; tests use in-memory fakes.

use std::io;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::TillError;

/// GATT service advertised by the common 58mm/80mm BLE receipt printers
pub const PRINTER_SERVICE_UUID: &str = "000018f0-0000-1000-8000-00805f9b34fb";

/// Write characteristic inside [`PRINTER_SERVICE_UUID`]
pub const WRITE_CHARACTERISTIC_UUID: &str = "00002af1-0000-1000-8000-00805f9b34fb";

/// Name prefixes used by the supported printer models
pub const DEFAULT_NAME_PREFIXES: [&str; 3] = ["XP-", "MTP-", "POS-"];

/// A printer found during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Stack-specific address (a MAC address on BlueZ)
    pub id: String,
    /// Advertised name
    pub name: String,
}

/// Which devices count as printers.
///
/// A device matches when its name starts with one of the prefixes or when it
/// advertises the service id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFilter {
    pub name_prefixes: Vec<String>,
    pub service_id: String,
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self {
            name_prefixes: DEFAULT_NAME_PREFIXES.iter().map(|p| p.to_string()).collect(),
            service_id: PRINTER_SERVICE_UUID.to_string(),
        }
    }
}

impl DeviceFilter {
    pub fn matches_name(&self, name: &str) -> bool {
        self.name_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && name.starts_with(prefix.as_str()))
    }

    pub fn matches_service(&self, services: &[String]) -> bool {
        services
            .iter()
            .any(|s| s.eq_ignore_ascii_case(&self.service_id))
    }
}

/// Discovery and link setup.
#[async_trait]
pub trait Radio: Send + Sync {
    /// Find the first device accepted by `filter`.
    ///
    /// Fails with [`TillError::Discovery`] when nothing matches.
    async fn discover(&self, filter: &DeviceFilter) -> Result<DeviceInfo, TillError>;

    /// Open a link to `device`.
    ///
    /// Fails with [`TillError::Connect`] when pairing or link setup is refused.
    async fn connect(&self, device: &DeviceInfo) -> Result<Box<dyn Link>, TillError>;
}

/// One open connection to a printer.
#[async_trait]
pub trait Link: Send {
    /// Locate the endpoint that accepts print data. Called once, right after
    /// the link is opened and before any write.
    async fn resolve_write_endpoint(&mut self, characteristic: &str) -> Result<(), TillError>;

    /// Write one chunk. Chunk sizing and pacing are the caller's business.
    async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Whether the underlying transport still considers the link up.
    fn is_connected(&self) -> bool;

    /// Tear the link down. Best effort; never fails.
    async fn disconnect(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_prefixes() {
        let filter = DeviceFilter::default();
        assert!(filter.matches_name("XP-58IIH"));
        assert!(filter.matches_name("MTP-II"));
        assert!(filter.matches_name("POS-80C"));
        assert!(!filter.matches_name("JBL Flip 5"));
        assert!(!filter.matches_name("xp-58"));
    }

    #[test]
    fn test_empty_prefix_matches_nothing() {
        let filter = DeviceFilter {
            name_prefixes: vec![String::new()],
            ..Default::default()
        };
        assert!(!filter.matches_name("anything"));
    }

    #[test]
    fn test_service_match_is_case_insensitive() {
        let filter = DeviceFilter::default();
        assert!(filter.matches_service(&["000018F0-0000-1000-8000-00805F9B34FB".to_string()]));
        assert!(!filter.matches_service(&["0000180f-0000-1000-8000-00805f9b34fb".to_string()]));
    }
}
