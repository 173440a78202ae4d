//! # Print Channels and Fallback
//!
//! A [`Channel`] is one way of getting a receipt onto paper. The
//! [`FallbackCoordinator`] tries its channels strictly in order, each at
//! most once per print, and stops at the first success:
//!
//! 1. [`direct::DirectChannel`]: wireless link straight to the printer
//! 2. [`dialog::DialogChannel`]: plain-text document through the system print queue
//! 3. [`relay::RelayChannel`]: HTTP to a relay process next to the printer
//!
//! Channels the client cannot use at all (per [`Capabilities`]) are skipped
//! and reported separately from channels that were tried and failed.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tillprint::channel::{Capabilities, FallbackCoordinator};
//! use tillprint::channel::direct::DirectChannel;
//! use tillprint::channel::dialog::{DialogChannel, LpDocumentPrinter};
//! use tillprint::channel::relay::{RelayChannel, RelayClient};
//! use tillprint::connection::{ConnectionConfig, ConnectionManager};
//! use tillprint::transport::BluezRadio;
//!
//! # async fn example(receipt: tillprint::Receipt) -> Result<(), tillprint::TillError> {
//! let manager = ConnectionManager::new(Arc::new(BluezRadio::new()), ConnectionConfig::default());
//! let relay = RelayClient::new("http://localhost:3001", Duration::from_secs(5))?;
//!
//! let coordinator = FallbackCoordinator::new(
//!     vec![
//!         Box::new(DirectChannel::new(manager)),
//!         Box::new(DialogChannel::new(Arc::new(LpDocumentPrinter::default()))),
//!         Box::new(RelayChannel::new(relay)),
//!     ],
//!     Capabilities::detect(),
//! );
//!
//! let outcome = coordinator.print(&receipt).await?;
//! println!("printed via {}", outcome.channel_used);
//! # Ok(())
//! # }
//! ```

pub mod dialog;
pub mod direct;
pub mod relay;

use std::env;
use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::encoder::render_text;
use crate::error::{ChannelFailure, ExhaustedReport, TillError};
use crate::receipt::Receipt;

/// Output path identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelKind {
    DirectWireless,
    NativeDialog,
    RelayService,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelKind::DirectWireless => "direct-wireless",
            ChannelKind::NativeDialog => "native-dialog",
            ChannelKind::RelayService => "relay-service",
        };
        f.write_str(s)
    }
}

/// What this client can do, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub supports_direct_wireless: bool,
    pub supports_native_dialog: bool,
}

impl Capabilities {
    /// Everything supported.
    pub fn all() -> Self {
        Self {
            supports_direct_wireless: true,
            supports_native_dialog: true,
        }
    }

    /// Probe the host: BlueZ tools for the wireless channel, CUPS `lp`
    /// for the dialog channel.
    pub fn detect() -> Self {
        let capabilities = Self {
            supports_direct_wireless: cfg!(target_os = "linux")
                && has_executable("bluetoothctl")
                && has_executable("rfcomm"),
            supports_native_dialog: has_executable("lp"),
        };
        debug!(?capabilities, "client capabilities detected");
        capabilities
    }

    /// The relay channel only needs a network and is always allowed.
    pub fn allows(&self, kind: ChannelKind) -> bool {
        match kind {
            ChannelKind::DirectWireless => self.supports_direct_wireless,
            ChannelKind::NativeDialog => self.supports_native_dialog,
            ChannelKind::RelayService => true,
        }
    }
}

fn has_executable(name: &str) -> bool {
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| is_file(&dir.join(name))))
        .unwrap_or(false)
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}

/// One output path.
#[async_trait]
pub trait Channel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// Print `receipt`, returning a human-readable confirmation.
    ///
    /// Return [`TillError::UnsupportedChannel`] when the channel turns out to
    /// be structurally unusable on this client; the coordinator then treats
    /// it as skipped rather than failed.
    async fn print(&self, receipt: &Receipt) -> Result<String, TillError>;
}

/// Result of a successful [`FallbackCoordinator::print`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintOutcome {
    pub success: bool,
    pub channel_used: ChannelKind,
    pub message: String,
}

/// Ordered multi-channel printing.
pub struct FallbackCoordinator {
    channels: Vec<Box<dyn Channel>>,
    capabilities: Capabilities,
}

impl FallbackCoordinator {
    pub fn new(channels: Vec<Box<dyn Channel>>, capabilities: Capabilities) -> Self {
        Self {
            channels,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Channel order as configured.
    pub fn channel_kinds(&self) -> Vec<ChannelKind> {
        self.channels.iter().map(|c| c.kind()).collect()
    }

    /// Print through the first channel that works.
    ///
    /// ## Errors
    ///
    /// - [`TillError::Validation`] straight away if a channel rejects the
    ///   receipt itself; no further channel is tried.
    /// - [`TillError::AllChannelsExhausted`] listing every attempted channel
    ///   with its reason, plus the skipped ones.
    pub async fn print(&self, receipt: &Receipt) -> Result<PrintOutcome, TillError> {
        let job = Uuid::new_v4();
        let span = info_span!("print_job", %job, order_id = %receipt.order_id());
        self.run(receipt).instrument(span).await
    }

    async fn run(&self, receipt: &Receipt) -> Result<PrintOutcome, TillError> {
        let mut report = ExhaustedReport::default();

        for channel in &self.channels {
            let kind = channel.kind();
            if !self.capabilities.allows(kind) {
                debug!(channel = %kind, "channel not supported on this client, skipping");
                report.skipped.push(kind);
                continue;
            }

            match channel.print(receipt).await {
                Ok(message) => {
                    info!(channel = %kind, %message, "receipt printed");
                    return Ok(PrintOutcome {
                        success: true,
                        channel_used: kind,
                        message,
                    });
                }
                Err(TillError::UnsupportedChannel(_)) => {
                    debug!(channel = %kind, "channel reported itself unsupported, skipping");
                    report.skipped.push(kind);
                }
                Err(TillError::Validation(e)) => {
                    warn!(channel = %kind, error = %e, "receipt rejected");
                    return Err(TillError::Validation(e));
                }
                Err(e) => {
                    warn!(channel = %kind, error = %e, "print channel failed, falling back");
                    report.failures.push(ChannelFailure {
                        channel: kind,
                        reason: e.to_string(),
                    });
                }
            }
        }

        warn!(%report, "all print channels exhausted");
        Err(TillError::AllChannelsExhausted(report))
    }
}

/// Simulation mode: log the receipt instead of printing it.
pub(crate) fn simulate(kind: ChannelKind, receipt: &Receipt) -> String {
    info!(
        channel = %kind,
        order_id = %receipt.order_id(),
        "simulation mode, receipt not sent to hardware:\n{}",
        render_text(receipt)
    );
    format!("Simulated print via {}", kind)
}
