//! # ESC/POS Protocol Implementation
//!
//! Low-level command builders for the ESC/POS command set spoken by
//! Bluetooth and USB thermal receipt printers.
//!
//! ## Module Structure
//!
//! - [`commands`]: Printer control (init, feed, cut)
//! - [`text`]: Alignment, emphasis, code page selection
//! - [`codepage`]: Unicode → WPC1252 byte encoding
//!
//! ## Usage Example
//!
//! ```
//! use tillprint::protocol::{codepage, commands, text};
//!
//! let mut data = Vec::new();
//! data.extend(commands::init());
//! data.extend(text::code_page(text::CodePage::Wpc1252));
//! data.extend(text::align(text::Alignment::Center));
//! data.extend(text::bold_on());
//! data.extend(codepage::encode("RECEIPT"));
//! data.push(commands::LF);
//! data.extend(text::bold_off());
//! data.extend(commands::cut_partial());
//!
//! // Send `data` to a printer via a transport...
//! ```

pub mod codepage;
pub mod commands;
pub mod text;
