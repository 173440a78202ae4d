//! # Intermediate Representation (IR)
//!
//! The IR is a "bytecode" representation that sits between the receipt
//! layout and its two outputs: ESC/POS bytes for the printer and plain
//! text for everything that cannot take raw bytes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │   Layout    │ ──► │     IR      │ ──► │   Codegen    │ ──► ESC/POS bytes
//! │ (encoder)   │     │  (Vec<Op>)  │     ├──────────────┤
//! └─────────────┘     └─────────────┘     │  Plain text  │ ──► String
//!                                         └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use tillprint::ir::{Op, Program};
//! use tillprint::protocol::text::Alignment;
//!
//! let mut program = Program::with_init();
//! program.push(Op::SetAlign(Alignment::Center));
//! program.push(Op::SetBold(true));
//! program.line("HELLO");
//! program.push(Op::Cut);
//!
//! let bytes = program.to_bytes();
//! assert_eq!(&bytes[..2], &[0x1B, 0x40]);
//!
//! let text = program.to_plain_text(9);
//! assert_eq!(text, "  HELLO\n");
//! ```

mod codegen;
mod ops;
mod plain;

// Backends add methods to Program via impl blocks
pub use ops::*;
