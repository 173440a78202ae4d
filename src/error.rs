//! # Error Types
//!
//! This module defines error types used throughout the tillprint library.
//!
//! Two layers:
//!
//! - [`ValidationError`]: malformed order or receipt input. Never retried,
//!   surfaced straight to the caller.
//! - [`TillError`]: everything that can go wrong while getting bytes onto
//!   paper. Channel-level failures are absorbed by the fallback coordinator;
//!   only [`TillError::AllChannelsExhausted`] reaches the end user.

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::channel::ChannelKind;

/// Input rejected while building a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Dine-in order without a usable table number
    #[error("dine-in order requires a table number")]
    MissingTableNumber,

    /// Delivery order without a building name
    #[error("delivery order requires a building name")]
    MissingBuildingName,

    /// Order type string not recognised
    #[error("unknown order type '{0}'")]
    UnknownOrderType(String),

    /// Payment method string not recognised
    #[error("unknown payment method '{0}'")]
    UnknownPaymentMethod(String),

    /// Order id missing or blank
    #[error("order id is required")]
    MissingOrderId,

    /// Line item without a name
    #[error("line item {index} has an empty name")]
    EmptyItemName { index: usize },

    /// Line item quantity below 1
    #[error("line item '{name}' has non-positive quantity {quantity}")]
    NonPositiveQuantity { name: String, quantity: i64 },

    /// Line item with a negative unit price
    #[error("line item '{name}' has negative price {price}")]
    NegativePrice { name: String, price: Decimal },

    /// No price in the pricing snapshot or on the item itself
    #[error("no price available for line item '{name}'")]
    MissingPrice { name: String },

    /// Stated total differs from the sum of the line items
    #[error("total {stated} does not match line items sum {computed}")]
    TotalMismatch { stated: Decimal, computed: Decimal },
}

/// Main error type for tillprint operations
#[derive(Debug, Error)]
pub enum TillError {
    /// Receipt input was malformed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No compatible printer found during discovery
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Pairing, link setup or endpoint resolution failed (includes timeouts)
    #[error("Connect error: {0}")]
    Connect(String),

    /// A chunk write failed mid-transmission
    #[error("Transport write error: {0}")]
    TransportWrite(String),

    /// The current client cannot use this channel at all
    #[error("Channel not supported on this client: {0}")]
    UnsupportedChannel(ChannelKind),

    /// Every channel was tried (or skipped) and none printed
    #[error("All print channels exhausted: {0}")]
    AllChannelsExhausted(ExhaustedReport),

    /// Print relay request failed or was refused
    #[error("Relay error: {0}")]
    Relay(String),

    /// OS print spooler primitive failed
    #[error("Spool error: {0}")]
    Spool(String),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single channel did not print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFailure {
    pub channel: ChannelKind,
    pub reason: String,
}

/// Diagnostics for a print call where no channel succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExhaustedReport {
    /// Channels that were attempted, in order, with their failure reason
    pub failures: Vec<ChannelFailure>,
    /// Channels skipped because the client does not support them
    pub skipped: Vec<ChannelKind>,
}

impl ExhaustedReport {
    /// Channels that were actually attempted, in attempt order.
    pub fn attempted(&self) -> Vec<ChannelKind> {
        self.failures.iter().map(|f| f.channel).collect()
    }
}

impl fmt::Display for ExhaustedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            write!(f, "no channel was attempted")?;
        }
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} failed: {}", failure.channel, failure.reason)?;
        }
        if !self.skipped.is_empty() {
            let skipped: Vec<String> = self.skipped.iter().map(|c| c.to_string()).collect();
            write!(f, " (skipped: {})", skipped.join(", "))?;
        }
        Ok(())
    }
}
