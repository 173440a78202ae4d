//! # IR Opcodes
//!
//! The intermediate representation for a receipt: a flat sequence of
//! opcodes produced by the layout pass and consumed by two backends,
//! ESC/POS bytes ([`Program::to_command`]) and plain text
//! ([`Program::to_plain_text`]).
//!
//! ```text
//! Receipt → layout → IR (inspectable) → codegen → bytes
//!                                    └→ plain   → text
//! ```
//!
//! Each opcode is a single atomic operation. Style changes are individual
//! ops so both backends can interpret them independently.

use crate::protocol::text::{Alignment, CodePage};

/// IR opcodes - the "bytecode" for receipt printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    // ========== Printer Control ==========
    /// Initialize printer (ESC @). Resets to default state.
    Init,

    /// Select the character code table (ESC t n).
    SetCodePage(CodePage),

    /// Feed `n` lines before the cut (ESC d n).
    FeedLines(u8),

    /// Partial cut, leaving a small hinge (GS V 1).
    Cut,

    // ========== Style Changes ==========
    /// Set text alignment. Applies from the next line start.
    SetAlign(Alignment),

    /// Enable/disable bold.
    SetBold(bool),

    // ========== Content ==========
    /// Text (no trailing newline). Unicode here, encoded by codegen.
    Text(String),

    /// Line feed (newline).
    Newline,
}

/// A receipt program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Create a program with an initial Init op.
    pub fn with_init() -> Self {
        Self {
            ops: vec![Op::Init],
        }
    }

    /// Add an op to the program.
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Append `text` followed by a newline.
    pub fn line(&mut self, text: impl Into<String>) {
        self.ops.push(Op::Text(text.into()));
        self.ops.push(Op::Newline);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter()
    }
}

impl FromIterator<Op> for Program {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_new() {
        let program = Program::new();
        assert!(program.is_empty());
    }

    #[test]
    fn test_program_with_init() {
        let program = Program::with_init();
        assert_eq!(program.len(), 1);
        assert_eq!(program.ops[0], Op::Init);
    }

    #[test]
    fn test_line_pushes_text_and_newline() {
        let mut program = Program::new();
        program.line("Total");
        assert_eq!(
            program.ops,
            vec![Op::Text("Total".into()), Op::Newline]
        );
    }

    #[test]
    fn test_from_iterator() {
        let program: Program = [Op::Init, Op::SetBold(true)].into_iter().collect();
        assert_eq!(program.len(), 2);
    }
}
