//! # Code Generation
//!
//! Converts IR programs to ESC/POS protocol bytes.

use super::ops::{Op, Program};
use crate::encoder::EncodedCommand;
use crate::protocol::{codepage, commands, text};

impl Program {
    /// Compile the IR program to an ESC/POS command buffer.
    pub fn to_command(&self) -> EncodedCommand {
        EncodedCommand::from(self.to_bytes())
    }

    /// Compile the IR program to raw ESC/POS bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();

        for op in &self.ops {
            match op {
                // ===== Printer Control =====
                Op::Init => {
                    out.extend(commands::init());
                }
                Op::SetCodePage(page) => {
                    out.extend(text::code_page(*page));
                }
                Op::FeedLines(n) => {
                    out.extend(commands::feed_lines(*n));
                }
                Op::Cut => {
                    out.extend(commands::cut_partial());
                }

                // ===== Style Changes =====
                Op::SetAlign(align) => {
                    out.extend(text::align(*align));
                }
                Op::SetBold(enabled) => {
                    if *enabled {
                        out.extend(text::bold_on());
                    } else {
                        out.extend(text::bold_off());
                    }
                }

                // ===== Content =====
                Op::Text(s) => {
                    out.extend(codepage::encode(s));
                }
                Op::Newline => {
                    out.push(commands::LF);
                }
            }
        }

        out
    }
}
