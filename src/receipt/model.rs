//! # Receipt Value Types
//!
//! A [`Receipt`] is the fixed schema every print channel consumes. It is
//! immutable once constructed: fields are private and the only ways in are
//! [`Receipt::new`] (validating) and [`build_receipt`](super::build_receipt).
//!
//! ## Wire Format
//!
//! Receipts serialize as snake_case JSON. Deserialization goes through
//! [`ReceiptParts`] and the same validation as [`Receipt::new`], and accepts
//! the camelCase names older clients send (`orderType`, `tableNumber`, ...).

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Header name used when the order does not carry one
pub const DEFAULT_RESTAURANT_NAME: &str = "RESTAURANT";

/// Address block used when the order does not carry one
pub const DEFAULT_ADDRESS_LINES: [&str; 2] = ["52/345-2 Ek Prachim Road, Lak Hok,", "Pathum Thani, 12000"];

/// Footer used when the order does not carry one
pub const DEFAULT_FOOTER_MESSAGE: &str = "Thank You & See You Again";

/// How the order is fulfilled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    #[serde(rename = "dine-in", alias = "DineIn", alias = "dine_in", alias = "Dine-In")]
    DineIn,
    #[serde(rename = "delivery", alias = "Delivery")]
    Delivery,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::DineIn => write!(f, "Dine-In"),
            OrderType::Delivery => write!(f, "Delivery"),
        }
    }
}

impl FromStr for OrderType {
    type Err = ValidationError;

    /// Accepts `dine-in`, `dine_in`, `DineIn`, `dine in` and `delivery` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "dinein" => Ok(OrderType::DineIn),
            "delivery" => Ok(OrderType::Delivery),
            _ => Err(ValidationError::UnknownOrderType(s.to_string())),
        }
    }
}

/// How the customer paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[serde(alias = "Cash")]
    Cash,
    #[serde(alias = "Card")]
    Card,
    #[serde(alias = "Mobile")]
    Mobile,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "Cash"),
            PaymentMethod::Card => write!(f, "Card"),
            PaymentMethod::Mobile => write!(f, "Mobile"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            "mobile" | "qr" | "promptpay" => Ok(PaymentMethod::Mobile),
            _ => Err(ValidationError::UnknownPaymentMethod(s.to_string())),
        }
    }
}

/// One row of the receipt body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    #[serde(alias = "price", alias = "unitPrice")]
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    /// `quantity × unit_price`
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

/// Unvalidated receipt fields.
///
/// This is the shape accepted over the wire and by [`Receipt::new`]. Header
/// and footer fields may be omitted; defaults are filled in on validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptParts {
    #[serde(default, alias = "restaurantName")]
    pub restaurant_name: Option<String>,
    #[serde(default, alias = "addressLines")]
    pub address_lines: Option<Vec<String>>,
    #[serde(alias = "orderType")]
    pub order_type: OrderType,
    #[serde(default, alias = "tableNumber")]
    pub table_number: Option<u32>,
    #[serde(default, alias = "buildingName")]
    pub building_name: Option<String>,
    #[serde(default, alias = "customerName")]
    pub customer_name: Option<String>,
    #[serde(alias = "orderId")]
    pub order_id: String,
    #[serde(alias = "dateTime")]
    pub timestamp: NaiveDateTime,
    #[serde(default, alias = "items", alias = "lineItems")]
    pub line_items: Vec<LineItem>,
    pub total: Decimal,
    #[serde(default, alias = "paymentMethod")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, alias = "customerNote")]
    pub note: Option<String>,
    #[serde(default, alias = "footerMessage")]
    pub footer_message: Option<String>,
}

/// A validated, immutable receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReceiptParts")]
pub struct Receipt {
    restaurant_name: String,
    address_lines: Vec<String>,
    order_type: OrderType,
    table_number: Option<u32>,
    building_name: Option<String>,
    customer_name: Option<String>,
    order_id: String,
    timestamp: NaiveDateTime,
    line_items: Vec<LineItem>,
    total: Decimal,
    payment_method: Option<PaymentMethod>,
    note: Option<String>,
    footer_message: String,
}

impl Receipt {
    /// Validate `parts` and freeze them into a receipt.
    ///
    /// ## Errors
    ///
    /// - [`ValidationError::MissingTableNumber`]: dine-in without a table (or table 0)
    /// - [`ValidationError::MissingBuildingName`]: delivery without a building
    /// - [`ValidationError::MissingOrderId`]: blank order id
    /// - [`ValidationError::EmptyItemName`] / [`ValidationError::NonPositiveQuantity`] /
    ///   [`ValidationError::NegativePrice`]: bad line item
    /// - [`ValidationError::TotalMismatch`]: `total` is not the line item sum
    pub fn new(parts: ReceiptParts) -> Result<Self, ValidationError> {
        let building_name = non_blank(parts.building_name);
        let customer_name = non_blank(parts.customer_name);

        let table_number = match parts.order_type {
            OrderType::DineIn => match parts.table_number {
                Some(table) if table > 0 => Some(table),
                _ => return Err(ValidationError::MissingTableNumber),
            },
            OrderType::Delivery => {
                if building_name.is_none() {
                    return Err(ValidationError::MissingBuildingName);
                }
                None
            }
        };

        let order_id = parts.order_id.trim().to_string();
        if order_id.is_empty() {
            return Err(ValidationError::MissingOrderId);
        }

        for (index, item) in parts.line_items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(ValidationError::EmptyItemName { index });
            }
            if item.quantity == 0 {
                return Err(ValidationError::NonPositiveQuantity {
                    name: item.name.clone(),
                    quantity: 0,
                });
            }
            if item.unit_price.is_sign_negative() && !item.unit_price.is_zero() {
                return Err(ValidationError::NegativePrice {
                    name: item.name.clone(),
                    price: item.unit_price,
                });
            }
        }

        let computed: Decimal = parts.line_items.iter().map(LineItem::line_total).sum();
        if computed != parts.total {
            return Err(ValidationError::TotalMismatch {
                stated: parts.total,
                computed,
            });
        }

        let (building_name, customer_name) = match parts.order_type {
            OrderType::Delivery => (building_name, customer_name),
            OrderType::DineIn => (None, None),
        };

        Ok(Self {
            restaurant_name: non_blank(parts.restaurant_name)
                .unwrap_or_else(|| DEFAULT_RESTAURANT_NAME.to_string()),
            address_lines: parts
                .address_lines
                .filter(|lines| !lines.is_empty())
                .unwrap_or_else(|| DEFAULT_ADDRESS_LINES.iter().map(|s| s.to_string()).collect()),
            order_type: parts.order_type,
            table_number,
            building_name,
            customer_name,
            order_id,
            timestamp: parts.timestamp,
            line_items: parts.line_items,
            total: parts.total,
            payment_method: parts.payment_method,
            note: non_blank(parts.note),
            footer_message: non_blank(parts.footer_message)
                .unwrap_or_else(|| DEFAULT_FOOTER_MESSAGE.to_string()),
        })
    }

    pub fn restaurant_name(&self) -> &str {
        &self.restaurant_name
    }

    pub fn address_lines(&self) -> &[String] {
        &self.address_lines
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Table number; always `Some` for dine-in, `None` for delivery
    pub fn table_number(&self) -> Option<u32> {
        self.table_number
    }

    /// Building name; always `Some` for delivery, `None` for dine-in
    pub fn building_name(&self) -> Option<&str> {
        self.building_name.as_deref()
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn footer_message(&self) -> &str {
        &self.footer_message
    }
}

impl TryFrom<ReceiptParts> for Receipt {
    type Error = ValidationError;

    fn try_from(parts: ReceiptParts) -> Result<Self, Self::Error> {
        Receipt::new(parts)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    fn dine_in_parts() -> ReceiptParts {
        ReceiptParts {
            restaurant_name: None,
            address_lines: None,
            order_type: OrderType::DineIn,
            table_number: Some(5),
            building_name: None,
            customer_name: None,
            order_id: "A-1001".into(),
            timestamp: timestamp(),
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
    fn test_new_applies_defaults() {
        let receipt = Receipt::new(dine_in_parts()).unwrap();
        assert_eq!(receipt.restaurant_name(), DEFAULT_RESTAURANT_NAME);
        assert_eq!(receipt.address_lines().len(), 2);
        assert_eq!(receipt.footer_message(), DEFAULT_FOOTER_MESSAGE);
        assert_eq!(receipt.table_number(), Some(5));
    }

    #[test]
    fn test_total_must_match_line_items() {
        let mut parts = dine_in_parts();
        parts.total = Decimal::new(12000, 2);
        assert_eq!(
            Receipt::new(parts),
            Err(ValidationError::TotalMismatch {
                stated: Decimal::new(12000, 2),
                computed: Decimal::new(13000, 2),
            })
        );
    }

    #[test]
    fn test_dine_in_requires_table() {
        let mut parts = dine_in_parts();
        parts.table_number = None;
        assert_eq!(Receipt::new(parts), Err(ValidationError::MissingTableNumber));

        let mut parts = dine_in_parts();
        parts.table_number = Some(0);
        assert_eq!(Receipt::new(parts), Err(ValidationError::MissingTableNumber));
    }

    #[test]
    fn test_delivery_requires_building() {
        let mut parts = dine_in_parts();
        parts.order_type = OrderType::Delivery;
        parts.building_name = Some("   ".into());
        assert_eq!(Receipt::new(parts), Err(ValidationError::MissingBuildingName));
    }

    #[test]
    fn test_delivery_drops_table_number() {
        let mut parts = dine_in_parts();
        parts.order_type = OrderType::Delivery;
        parts.building_name = Some("Tower B".into());
        parts.customer_name = Some("Khin".into());
        let receipt = Receipt::new(parts).unwrap();
        assert_eq!(receipt.table_number(), None);
        assert_eq!(receipt.building_name(), Some("Tower B"));
        assert_eq!(receipt.customer_name(), Some("Khin"));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut parts = dine_in_parts();
        parts.line_items[1].quantity = 0;
        assert!(matches!(
            Receipt::new(parts),
            Err(ValidationError::NonPositiveQuantity { .. })
        ));
    }

    #[test]
    fn test_empty_item_list_is_valid() {
        let mut parts = dine_in_parts();
        parts.line_items.clear();
        parts.total = Decimal::ZERO;
        let receipt = Receipt::new(parts).unwrap();
        assert!(receipt.line_items().is_empty());
        assert!(receipt.total().is_zero());
    }

    #[test]
    fn test_order_type_parsing() {
        assert_eq!("dine-in".parse::<OrderType>(), Ok(OrderType::DineIn));
        assert_eq!("Dine In".parse::<OrderType>(), Ok(OrderType::DineIn));
        assert_eq!("DELIVERY".parse::<OrderType>(), Ok(OrderType::Delivery));
        assert!("takeaway".parse::<OrderType>().is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{
            "orderType": "delivery",
            "orderId": "D-7",
            "timestamp": "2026-10-16T12:30:00",
            "items": [{"name": "Tea", "quantity": 1, "price": "25.00"}],
            "total": "25.00"
        }"#;
        let err = serde_json::from_str::<Receipt>(json).unwrap_err();
        assert!(err.to_string().contains("building name"));
    }

    #[test]
    fn test_deserialize_camel_case_aliases() {
        let json = r#"{
            "orderType": "dine-in",
            "tableNumber": 3,
            "orderId": "A-9",
            "timestamp": "2026-10-16T08:05:00",
            "items": [{"name": "Tea", "quantity": 2, "price": 25}],
            "total": 50,
            "paymentMethod": "card",
            "customerNote": "no sugar"
        }"#;
        let receipt: Receipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.table_number(), Some(3));
        assert_eq!(receipt.payment_method(), Some(PaymentMethod::Card));
        assert_eq!(receipt.note(), Some("no sugar"));
    }
}
