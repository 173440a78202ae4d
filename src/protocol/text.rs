//! # ESC/POS Text Styling Commands
//!
//! The receipt layout only needs three text controls:
//!
//! | Style | Command | Effect |
//! |-------|---------|--------|
//! | Alignment | ESC a n | Left / center / right justification |
//! | Bold | ESC E n | **Emphasized** text |
//! | Code page | ESC t n | Character table for bytes 0x80–0xFF |
//!
//! ## Text Alignment
//!
//! ```text
//! Left aligned (default)    |LEFT TEXT
//! Center aligned            |  CENTER TEXT
//! Right aligned             |      RIGHT TEXT
//! ```

use super::commands::ESC;

// ============================================================================
// TEXT ALIGNMENT
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// # Set Justification (ESC a n)
///
/// ## Protocol Details
///
/// | Format  | Bytes   |
/// |---------|---------|
/// | ASCII   | ESC a n |
/// | Hex     | 1B 61 n |
/// | Decimal | 27 97 n |
///
/// ## Parameters
///
/// - `n = 0`: Left (default)
/// - `n = 1`: Center
/// - `n = 2`: Right
///
/// Only takes effect at the start of a line.
///
/// ## Example
///
/// ```
/// use tillprint::protocol::text::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

// ============================================================================
// TEXT EMPHASIS (BOLD)
// ============================================================================

/// # Turn Emphasized Mode On (ESC E 1)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC E 1  |
/// | Hex     | 1B 45 01 |
#[inline]
pub fn bold_on() -> Vec<u8> {
    vec![ESC, b'E', 1]
}

/// # Turn Emphasized Mode Off (ESC E 0)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC E 0  |
/// | Hex     | 1B 45 00 |
#[inline]
pub fn bold_off() -> Vec<u8> {
    vec![ESC, b'E', 0]
}

// ============================================================================
// CODE PAGE
// ============================================================================

/// Character code tables used by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CodePage {
    /// WPC1252 (Windows Latin-1) - matches the sanitizer's glyph range
    Wpc1252 = 16,
}

/// # Select Character Code Table (ESC t n)
///
/// ## Protocol Details
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC t n  |
/// | Hex     | 1B 74 n  |
/// | Decimal | 27 116 n |
///
/// ## Example
///
/// ```
/// use tillprint::protocol::text::{code_page, CodePage};
///
/// assert_eq!(code_page(CodePage::Wpc1252), vec![0x1B, 0x74, 16]);
/// ```
pub fn code_page(cp: CodePage) -> Vec<u8> {
    vec![ESC, b't', cp as u8]
}

// ============================================================================
// TESTS
// ============================================================================
