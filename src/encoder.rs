//! # Receipt Command Encoder
//!
//! Lays out a [`Receipt`] on 32-column paper as an [`ir::Program`], then
//! compiles it to ESC/POS bytes ([`encode`]) or plain text ([`render_text`]).
//!
//! ## Layout
//!
//! ```text
//!            RESTAURANT                  ← centered, bold
//! ================================
//! 52/345-2 Ek Prachim Road, Lak Hok,     ← centered
//!       Pathum Thani, 12000
//!
//! Order Type : Dine-In
//! Table No   : 5
//! Date       : 16/10/2026
//! Time       : 12:30 PM
//! Order ID   : A-1001
//! --------------------------------
//! Item           Qty     Price
//! --------------------------------
//! Fried Rice       2    120.00
//! Water            1     10.00
//! --------------------------------
//!                    Total: 130.00       ← right, bold
//! Payment    : Cash
//! --------------------------------
//!
//!    Thank You & See You Again           ← centered
//! ```
//!
//! Column widths and control codes are fixed. Every free-text field passes
//! through the [`Transliterator`] so data can never smuggle control bytes
//! into the stream. The encoder does not recompute the total; it prints
//! what [`Receipt::new`] validated.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::ir::{Op, Program};
use crate::protocol::text::{Alignment, CodePage};
use crate::receipt::{OrderType, Receipt};
use crate::sanitize::Transliterator;

/// Characters per line on 58mm paper with font A
pub const PAPER_COLUMNS: usize = 32;

/// Width of the item name column
pub const NAME_COLUMN: usize = 15;

/// Names longer than [`NAME_COLUMN`] keep this many characters plus `...`
const NAME_TRUNCATED: usize = 12;

/// Width of metadata labels before the `:`
const LABEL_WIDTH: usize = 10;

/// Lines fed before the cut so the footer clears the blade
const FEED_BEFORE_CUT: u8 = 3;

/// An encoded ESC/POS command stream.
///
/// Produced once per print request and consumed by value by exactly one
/// transmission. There is deliberately no `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct EncodedCommand {
    bytes: Vec<u8>,
}

impl EncodedCommand {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for EncodedCommand {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

/// Receipt layout engine.
#[derive(Debug, Clone)]
pub struct Encoder {
    transliterator: Transliterator,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::with_transliterator(Transliterator::builtin())
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom phrase table for non-representable text.
    pub fn with_transliterator(transliterator: Transliterator) -> Self {
        Self { transliterator }
    }

    /// Build the IR program for `receipt`.
    pub fn layout(&self, receipt: &Receipt) -> Program {
        let clean = |s: &str| self.transliterator.sanitize(s);
        let rule = |c: char| c.to_string().repeat(PAPER_COLUMNS);

        let mut program = Program::with_init();
        program.push(Op::SetCodePage(CodePage::Wpc1252));

        // Header
        program.push(Op::SetAlign(Alignment::Center));
        program.push(Op::SetBold(true));
        program.line(clean(receipt.restaurant_name()));
        program.push(Op::SetBold(false));
        program.line(rule('='));
        for line in receipt.address_lines() {
            program.line(clean(line));
        }
        program.push(Op::Newline);

        // Metadata
        program.push(Op::SetAlign(Alignment::Left));
        program.line(label("Order Type", &receipt.order_type().to_string()));
        match receipt.order_type() {
            OrderType::DineIn => {
                if let Some(table) = receipt.table_number() {
                    program.line(label("Table No", &table.to_string()));
                }
            }
            OrderType::Delivery => {
                if let Some(customer) = receipt.customer_name() {
                    program.line(label("Customer", &clean(customer)));
                }
                if let Some(building) = receipt.building_name() {
                    program.line(label("Building", &clean(building)));
                }
            }
        }
        let timestamp = receipt.timestamp();
        program.line(label("Date", &timestamp.format("%d/%m/%Y").to_string()));
        program.line(label("Time", &timestamp.format("%I:%M %p").to_string()));
        program.line(label("Order ID", &clean(receipt.order_id())));

        // Items
        program.line(rule('-'));
        program.line(row("Item", "Qty", "Price"));
        program.line(rule('-'));
        for item in receipt.line_items() {
            let name = truncate_name(&clean(&item.name));
            program.line(row(
                &name,
                &item.quantity.to_string(),
                &money(item.line_total()),
            ));
        }

        // Total
        program.line(rule('-'));
        program.push(Op::SetAlign(Alignment::Right));
        program.push(Op::SetBold(true));
        program.line(format!("Total: {}", money(receipt.total())));
        program.push(Op::SetBold(false));
        program.push(Op::SetAlign(Alignment::Left));

        if let Some(payment) = receipt.payment_method() {
            program.line(label("Payment", &payment.to_string()));
        }
        if let Some(note) = receipt.note() {
            program.line(label("Note", &clean(note)));
        }

        // Footer
        program.line(rule('-'));
        program.push(Op::Newline);
        program.push(Op::SetAlign(Alignment::Center));
        program.line(clean(receipt.footer_message()));
        program.push(Op::SetAlign(Alignment::Left));
        program.push(Op::FeedLines(FEED_BEFORE_CUT));
        program.push(Op::Cut);

        program
    }

    /// Encode `receipt` as ESC/POS bytes.
    pub fn encode(&self, receipt: &Receipt) -> EncodedCommand {
        self.layout(receipt).to_command()
    }

    /// Render `receipt` as the plain text that would appear on the paper.
    pub fn render_text(&self, receipt: &Receipt) -> String {
        self.layout(receipt).to_plain_text(PAPER_COLUMNS)
    }
}

/// Encode with the built-in transliteration table.
pub fn encode(receipt: &Receipt) -> EncodedCommand {
    Encoder::default().encode(receipt)
}

/// Plain-text rendering with the built-in transliteration table.
pub fn render_text(receipt: &Receipt) -> String {
    Encoder::default().render_text(receipt)
}

fn label(name: &str, value: &str) -> String {
    format!("{:<width$} : {}", name, value, width = LABEL_WIDTH)
}

fn row(name: &str, qty: &str, price: &str) -> String {
    format!("{:<15}{:>3} {:>9}", name, qty, price)
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() > NAME_COLUMN {
        let head: String = name.chars().take(NAME_TRUNCATED).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

/// Two decimal places, half-up.
fn money(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::{LineItem, PaymentMethod, ReceiptParts};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn parts() -> ReceiptParts {
        ReceiptParts {
            restaurant_name: None,
            address_lines: None,
            order_type: OrderType::DineIn,
            table_number: Some(5),
            building_name: None,
            customer_name: None,
            order_id: "A-1001".into(),
            timestamp: NaiveDate::from_ymd_opt(2026, 10, 16)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap(),
            line_items: vec![
                LineItem::new("Fried Rice", 2, Decimal::new(6000, 2)),
                LineItem::new("Water", 1, Decimal::new(1000, 2)),
            ],
            total: Decimal::new(13000, 2),
            payment_method: Some(PaymentMethod::Cash),
            note: None,
            footer_message: None,
        }
    }

    #[test]
    fn test_row_padding() {
        assert_eq!(row("Fried Rice", "2", "120.00"), "Fried Rice       2    120.00");
        assert_eq!(row("Item", "Qty", "Price"), "Item           Qty     Price");
    }

    #[test]
    fn test_label_padding() {
        assert_eq!(label("Order Type", "Dine-In"), "Order Type : Dine-In");
        assert_eq!(label("Table No", "5"), "Table No   : 5");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("Fried Rice"), "Fried Rice");
        assert_eq!(truncate_name("Exactly Fifteen"), "Exactly Fifteen");
        assert_eq!(truncate_name("Sixteen chars!!!"), "Sixteen char...");
    }

    #[test]
    fn test_money() {
        assert_eq!(money(Decimal::new(120, 0)), "120.00");
        assert_eq!(money(Decimal::new(12345, 3)), "12.35");
        assert_eq!(money(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_encode_is_deterministic() {
        let receipt = Receipt::new(parts()).unwrap();
        assert_eq!(encode(&receipt), encode(&receipt));
    }

    #[test]
    fn test_encode_frames_stream() {
        let receipt = Receipt::new(parts()).unwrap();
        let bytes = encode(&receipt).into_bytes();
        assert!(bytes.starts_with(&[0x1B, 0x40, 0x1B, 0x74, 0x10]));
        assert!(bytes.ends_with(&[0x1B, 0x64, 0x03, 0x1D, 0x56, 0x01]));
    }

    #[test]
    fn test_total_line_is_bold_and_right_aligned() {
        let receipt = Receipt::new(parts()).unwrap();
        let bytes = encode(&receipt).into_bytes();
        let mut expected = vec![0x1B, 0x61, 0x02, 0x1B, 0x45, 0x01];
        expected.extend_from_slice(b"Total: 130.00\n");
        expected.extend_from_slice(&[0x1B, 0x45, 0x00, 0x1B, 0x61, 0x00]);
        assert!(bytes.windows(expected.len()).any(|w| w == expected.as_slice()));
    }

    #[test]
    fn test_delivery_metadata() {
        let mut parts = parts();
        parts.order_type = OrderType::Delivery;
        parts.table_number = None;
        parts.building_name = Some("Tower B".into());
        parts.customer_name = Some("Khin".into());
        let text = render_text(&Receipt::new(parts).unwrap());
        assert!(text.contains("Order Type : Delivery\nCustomer   : Khin\nBuilding   : Tower B\n"));
        assert!(!text.contains("Table No"));
    }

    #[test]
    fn test_empty_items_still_have_total() {
        let mut parts = parts();
        parts.line_items.clear();
        parts.total = Decimal::ZERO;
        let text = render_text(&Receipt::new(parts).unwrap());
        assert!(text.contains("Total: 0.00"));
    }

    #[test]
    fn test_free_text_is_sanitized() {
        let mut parts = parts();
        parts.note = Some("extra\u{1B}@spicy".into());
        parts.line_items = vec![LineItem::new("ကြက်သားဟင်း", 1, Decimal::new(80, 0))];
        parts.total = Decimal::new(80, 0);
        let receipt = Receipt::new(parts).unwrap();

        let text = render_text(&receipt);
        assert!(text.contains("Note       : extra@spicy\n"));
        assert!(text.contains("Chicken Curry    1     80.00\n"));

        // The only ESC bytes are the ones the encoder emitted itself
        let bytes = encode(&receipt).into_bytes();
        let emitted = Encoder::new()
            .layout(&receipt)
            .iter()
            .filter(|op| {
                matches!(
                    op,
                    Op::Init | Op::SetCodePage(_) | Op::SetAlign(_) | Op::SetBold(_) | Op::FeedLines(_)
                )
            })
            .count();
        assert_eq!(bytes.iter().filter(|&&b| b == 0x1B).count(), emitted);
    }
}
