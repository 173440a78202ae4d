//! # Tillprint - Restaurant Receipt Printing
//!
//! Tillprint turns point-of-sale orders into printed receipts on 58mm
//! ESC/POS thermal printers. It provides:
//!
//! - **Receipt model**: order normalization and validation
//! - **Encoding**: a 32-column receipt layout compiled to ESC/POS bytes or plain text
//! - **Connection**: a managed wireless link with chunked transmission
//! - **Fallback**: direct link, then system print, then an HTTP print relay
//! - **Relay**: the HTTP service that prints on behalf of other clients
//!
//! ## Quick Start
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//! use tillprint::receipt::{build_receipt, PricingSnapshot, RawItem, RawOrder};
//!
//! let order = RawOrder {
//!     order_id: Some("A-1001".into()),
//!     order_type: "dine-in".into(),
//!     table_number: Some(5),
//!     items: vec![RawItem {
//!         name: "Fried Rice".into(),
//!         quantity: 2,
//!         price: Some(Decimal::new(6000, 2)),
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//! let captured = NaiveDate::from_ymd_opt(2026, 10, 16)
//!     .unwrap()
//!     .and_hms_opt(12, 30, 0)
//!     .unwrap();
//!
//! let receipt: tillprint::Receipt = build_receipt(&order, &PricingSnapshot::new(captured))?;
//!
//! // ESC/POS bytes for the printer
//! let command = tillprint::encode(&receipt);
//! assert_eq!(&command.as_bytes()[..2], &[0x1B, 0x40]);
//!
//! // The same layout as text
//! let text = tillprint::render_text(&receipt);
//! assert!(text.contains("Fried Rice"));
//! # Ok::<(), tillprint::TillError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`receipt`] | Receipt model and order normalization |
//! | [`sanitize`] | Transliteration to printable text |
//! | [`protocol`] | ESC/POS command builders |
//! | [`ir`] | Print program with byte and text backends |
//! | [`encoder`] | Receipt layout |
//! | [`connection`] | Printer link lifecycle |
//! | [`transport`] | Chunked transmission and the BlueZ radio |
//! | [`channel`] | Print channels and the fallback coordinator |
//! | [`server`] | HTTP print relay |
//! | [`config`] | Environment settings |
//! | [`error`] | Error types |

pub mod channel;
pub mod config;
pub mod connection;
pub mod encoder;
pub mod error;
pub mod ir;
pub mod logging;
pub mod protocol;
pub mod receipt;
pub mod sanitize;
pub mod server;
pub mod transport;

// Re-exports for convenience
pub use channel::{Capabilities, ChannelKind, FallbackCoordinator, PrintOutcome};
pub use connection::ConnectionManager;
pub use encoder::{EncodedCommand, encode, render_text};
pub use error::{TillError, ValidationError};
pub use receipt::{Receipt, build_receipt};
pub use sanitize::sanitize;
