//! Order normalization: turns the loosely-typed order the POS front end
//! produces into a validated [`Receipt`].

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::model::{LineItem, OrderType, PaymentMethod, Receipt, ReceiptParts};
use crate::error::ValidationError;

/// An order as the front end hands it over.
///
/// Strings are kept raw (`"dine-in"`, `"cash"`) and quantities signed so that
/// bad input is reported as a [`ValidationError`] instead of a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    #[serde(default, alias = "_id", alias = "order_id")]
    pub order_id: Option<String>,
    #[serde(alias = "order_type")]
    pub order_type: String,
    #[serde(default, alias = "table_number")]
    pub table_number: Option<i64>,
    #[serde(default, alias = "building_name")]
    pub building_name: Option<String>,
    #[serde(default, alias = "customer_name")]
    pub customer_name: Option<String>,
    #[serde(default, alias = "orderItems")]
    pub items: Vec<RawItem>,
    #[serde(default, alias = "payment_method")]
    pub payment_method: Option<String>,
    #[serde(default, alias = "customerNote")]
    pub note: Option<String>,
    #[serde(default, alias = "restaurant_name")]
    pub restaurant_name: Option<String>,
    #[serde(default, alias = "address_lines")]
    pub address_lines: Option<Vec<String>>,
    #[serde(default, alias = "footer_message")]
    pub footer_message: Option<String>,
    #[serde(default, alias = "placed_at", alias = "createdAt")]
    pub placed_at: Option<NaiveDateTime>,
}

/// One ordered item before pricing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    #[serde(default, alias = "_id", alias = "item_id")]
    pub item_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// Unit prices captured at checkout.
///
/// Keys are item ids or item names; ids win when both are present.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSnapshot {
    #[serde(default)]
    pub prices: HashMap<String, Decimal>,
    #[serde(alias = "captured_at")]
    pub captured_at: NaiveDateTime,
}

impl PricingSnapshot {
    pub fn new(captured_at: NaiveDateTime) -> Self {
        Self {
            prices: HashMap::new(),
            captured_at,
        }
    }

    /// Add a price keyed by item id or name
    pub fn with_price(mut self, key: impl Into<String>, price: Decimal) -> Self {
        self.prices.insert(key.into(), price);
        self
    }

    fn unit_price(&self, item: &RawItem) -> Option<Decimal> {
        item.item_id
            .as_ref()
            .and_then(|id| self.prices.get(id))
            .or_else(|| self.prices.get(item.name.trim()))
            .copied()
            .or(item.price)
    }
}

/// Build a validated receipt from a raw order and a pricing snapshot.
///
/// The total is computed here from the resolved unit prices, then checked
/// again by [`Receipt::new`]. The timestamp is the order's `placed_at`, or the
/// snapshot capture time when the order has none.
///
/// ## Errors
///
/// Any [`ValidationError`]: unknown order type or payment method, dine-in
/// without a table, delivery without a building, blank order id, and line
/// items with an empty name, quantity below 1, a negative price or no price.
pub fn build_receipt(
    order: &RawOrder,
    pricing: &PricingSnapshot,
) -> Result<Receipt, ValidationError> {
    let order_type: OrderType = order.order_type.parse()?;

    let table_number = match order_type {
        OrderType::DineIn => match order.table_number {
            Some(n) if n > 0 && n <= u32::MAX as i64 => Some(n as u32),
            _ => return Err(ValidationError::MissingTableNumber),
        },
        OrderType::Delivery => None,
    };

    let order_id = order
        .order_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ValidationError::MissingOrderId)?;

    let mut line_items = Vec::with_capacity(order.items.len());
    for (index, item) in order.items.iter().enumerate() {
        let name = item.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyItemName { index });
        }
        if item.quantity < 1 || item.quantity > u32::MAX as i64 {
            return Err(ValidationError::NonPositiveQuantity {
                name: name.to_string(),
                quantity: item.quantity,
            });
        }
        let unit_price = pricing
            .unit_price(item)
            .ok_or_else(|| ValidationError::MissingPrice {
                name: name.to_string(),
            })?;
        if unit_price < Decimal::ZERO {
            return Err(ValidationError::NegativePrice {
                name: name.to_string(),
                price: unit_price,
            });
        }
        line_items.push(LineItem::new(name, item.quantity as u32, unit_price));
    }

    let payment_method = order
        .payment_method
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .map(str::parse::<PaymentMethod>)
        .transpose()?;

    let total = line_items.iter().map(LineItem::line_total).sum();

    Receipt::new(ReceiptParts {
        restaurant_name: order.restaurant_name.clone(),
        address_lines: order.address_lines.clone(),
        order_type,
        table_number,
        building_name: order.building_name.clone(),
        customer_name: order.customer_name.clone(),
        order_id: order_id.to_string(),
        timestamp: order.placed_at.unwrap_or(pricing.captured_at),
        line_items,
        total,
        payment_method,
        note: order.note.clone(),
        footer_message: order.footer_message.clone(),
    })
}
