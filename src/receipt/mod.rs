//! # Receipt Model
//!
//! Normalizes heterogeneous order data into the fixed [`Receipt`] schema
//! that every print channel consumes.
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
//!         name: "Water".into(),
//!         quantity: 1,
//!         price: Some(Decimal::new(1000, 2)),
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//! let captured = NaiveDate::from_ymd_opt(2026, 10, 16)
//!     .unwrap()
//!     .and_hms_opt(12, 0, 0)
//!     .unwrap();
//!
//! let receipt = build_receipt(&order, &PricingSnapshot::new(captured))?;
//! assert_eq!(receipt.total(), Decimal::new(1000, 2));
//! # Ok::<(), tillprint::error::ValidationError>(())
//! ```

mod model;
mod order;

pub use model::{
    DEFAULT_ADDRESS_LINES, DEFAULT_FOOTER_MESSAGE, DEFAULT_RESTAURANT_NAME, LineItem, OrderType,
    PaymentMethod, Receipt, ReceiptParts,
};
pub use order::{PricingSnapshot, RawItem, RawOrder, build_receipt};
