//! # WPC1252 Text Encoding
//!
//! Converts Unicode strings to the single-byte WPC1252 table selected by
//! [`super::text::code_page`]. ASCII passes through unchanged and the
//! Latin-1 Supplement maps one-to-one. Characters with no WPC1252 byte are
//! replaced with `?` and a warning is logged.
//!
//! Receipt text is sanitized before it gets here, so replacements only show
//! up when raw text bypasses [`crate::sanitize`].

use encoding_rs::WINDOWS_1252;
use tracing::warn;

/// Encode a Unicode string as WPC1252 bytes.
pub fn encode(s: &str) -> Vec<u8> {
    if s.is_ascii() {
        return s.as_bytes().to_vec();
    }

    let mut out = Vec::with_capacity(s.len());
    let mut buf = [0u8; 4];
    for ch in s.chars() {
        if ch.is_ascii() {
            out.push(ch as u8);
            continue;
        }
        let (bytes, _, had_errors) = WINDOWS_1252.encode(ch.encode_utf8(&mut buf));
        if had_errors || bytes.len() != 1 {
            warn!(
                character = %ch,
                code_point = format!("U+{:04X}", ch as u32),
                "unmapped character, replacing with '?'"
            );
            out.push(b'?');
        } else {
            out.push(bytes[0]);
        }
    }
    out
}
