//! # Printer Transport Layer
//!
//! Getting bytes to the printer.
//!
//! - [`bluetooth`]: BlueZ + RFCOMM implementation of the radio traits (Linux)
//! - [`scheduler`]: chunked, paced transmission over any link

pub mod bluetooth;
pub mod scheduler;

pub use bluetooth::BluezRadio;
pub use scheduler::{ChunkPolicy, TransmitReport, transmit};
