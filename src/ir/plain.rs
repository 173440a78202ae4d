//! # Plain Text Backend
//!
//! Renders an IR program as the fixed-width text a person would see on the
//! paper. Used wherever bytes cannot go to the printer directly: the system
//! print dialog, the relay's formatted-print fallback, simulation logs and
//! the CLI `preview` command.
//!
//! Alignment is emulated with spaces against the column count. Bold,
//! code page, feed and cut have no plain-text equivalent and are ignored.

use super::ops::{Op, Program};
use crate::protocol::text::Alignment;

impl Program {
    /// Render the program as plain text, `columns` characters wide.
    ///
    /// Every line ends with `\n`. Text longer than `columns` is left as is.
    pub fn to_plain_text(&self, columns: usize) -> String {
        let mut out = String::new();
        let mut line = String::new();
        // Alignment latched at the start of each line, as the printer does.
        let mut align = Alignment::Left;
        let mut line_align = Alignment::Left;

        for op in &self.ops {
            match op {
                Op::SetAlign(a) => {
                    align = *a;
                    if line.is_empty() {
                        line_align = *a;
                    }
                }
                Op::Text(s) => {
                    if line.is_empty() {
                        line_align = align;
                    }
                    line.push_str(s);
                }
                Op::Newline => {
                    if line.is_empty() {
                        line_align = align;
                    }
                    out.push_str(&pad(&line, line_align, columns));
                    out.push('\n');
                    line.clear();
                }
                Op::Init => {
                    align = Alignment::Left;
                    line_align = Alignment::Left;
                }
                Op::SetCodePage(_) | Op::SetBold(_) | Op::FeedLines(_) | Op::Cut => {}
            }
        }

        if !line.is_empty() {
            out.push_str(&pad(&line, line_align, columns));
            out.push('\n');
        }
        out
    }
}

fn pad(line: &str, align: Alignment, columns: usize) -> String {
    let width = line.chars().count();
    if width == 0 || width >= columns {
        return line.to_string();
    }
    let slack = columns - width;
    match align {
        Alignment::Left => line.to_string(),
        Alignment::Center => format!("{}{}", " ".repeat(slack / 2), line),
        Alignment::Right => format!("{}{}", " ".repeat(slack), line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_text() {
        let mut program = Program::with_init();
        program.line("Hello");
        assert_eq!(program.to_plain_text(10), "Hello\n");
    }

    #[test]
    fn test_center_and_right() {
        let mut program = Program::new();
        program.push(Op::SetAlign(Alignment::Center));
        program.line("ab");
        program.push(Op::SetAlign(Alignment::Right));
        program.line("ab");
        program.push(Op::SetAlign(Alignment::Left));
        program.line("ab");
        assert_eq!(program.to_plain_text(8), "   ab\n      ab\nab\n");
    }

    #[test]
    fn test_alignment_change_mid_line_applies_to_next_line() {
        let mut program = Program::new();
        program.push(Op::Text("ab".into()));
        program.push(Op::SetAlign(Alignment::Right));
        program.push(Op::Text("cd".into()));
        program.push(Op::Newline);
        program.line("ef");
        assert_eq!(program.to_plain_text(6), "abcd\n    ef\n");
    }

    #[test]
    fn test_styles_and_cut_are_ignored() {
        let mut program = Program::with_init();
        program.push(Op::SetBold(true));
        program.line("X");
        program.push(Op::FeedLines(3));
        program.push(Op::Cut);
        assert_eq!(program.to_plain_text(4), "X\n");
    }

    #[test]
    fn test_blank_line_and_unterminated_text() {
        let mut program = Program::new();
        program.push(Op::Newline);
        program.push(Op::Text("tail".into()));
        assert_eq!(program.to_plain_text(8), "\ntail\n");
    }

    #[test]
    fn test_blank_centered_line_has_no_padding() {
        let mut program = Program::new();
        program.push(Op::SetAlign(Alignment::Center));
        program.push(Op::Newline);
        assert_eq!(program.to_plain_text(8), "\n");
    }

    #[test]
    fn test_overlong_line_not_padded() {
        let mut program = Program::new();
        program.push(Op::SetAlign(Alignment::Center));
        program.line("abcdef");
        assert_eq!(program.to_plain_text(4), "abcdef\n");
    }
}
