//! Catalogue, order and sales data structures shared across the API and
//! storage crates.

pub mod money;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

pub use money::{from_cents, from_wide_cents, line_total_cents, to_cents, AmountError};

pub type ProductId = i32;
pub type OrderId = i32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub is_sale: bool,
    pub sale_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub is_sale: bool,
    pub sale_price: Option<Decimal>,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        require_text("name", &self.name)?;
        require_non_negative("price", self.price)?;
        if let Some(sale_price) = self.sale_price {
            require_non_negative("sale_price", sale_price)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: Option<i32>,
    pub full_name: String,
    pub email: String,
    pub shipping_address: String,
    pub amount_paid: Decimal,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Checks the order before it reaches storage. Product existence is
    /// verified by the store inside the insert transaction.
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        require_text("full_name", &self.full_name)?;
        require_text("email", &self.email)?;
        require_text("shipping_address", &self.shipping_address)?;
        require_non_negative("amount_paid", self.amount_paid)?;
        for item in &self.items {
            require_quantity(item.product_id, item.quantity)?;
            require_non_negative("price", item.price)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: Option<i32>,
    pub full_name: String,
    pub email: String,
    pub shipping_address: String,
    pub amount_paid: Decimal,
    pub date_ordered: DateTime<Utc>,
    pub shipped: bool,
    pub date_shipped: Option<DateTime<Utc>>,
}

impl OrderRecord {
    pub fn shipping_state(&self) -> ShippingState {
        ShippingState {
            shipped: self.shipped,
            date_shipped: self.date_shipped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRecord {
    pub id: i32,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub user_id: Option<i32>,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetail {
    pub order: OrderRecord,
    pub items: Vec<OrderItemRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemUpdate {
    pub product_id: ProductId,
    pub quantity: Option<i32>,
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub shipped: Option<bool>,
    pub date_shipped: Option<DateTime<Utc>>,
    pub items: Option<Vec<OrderItemUpdate>>,
}

impl OrderUpdate {
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        for item in self.items.iter().flatten() {
            if let Some(quantity) = item.quantity {
                require_quantity(item.product_id, quantity)?;
            }
            if let Some(price) = item.price {
                require_non_negative("price", price)?;
            }
        }
        Ok(())
    }
}

/// Shipping flags of an order, kept together so the auto-dating rule lives
/// in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingState {
    pub shipped: bool,
    pub date_shipped: Option<DateTime<Utc>>,
}

impl ShippingState {
    /// Applies the status part of an update. A shipped order without a ship
    /// date is stamped with `now`; un-shipping keeps any existing date.
    pub fn apply(self, update: &OrderUpdate, now: DateTime<Utc>) -> Self {
        let shipped = update.shipped.unwrap_or(self.shipped);
        let mut date_shipped = update.date_shipped.or(self.date_shipped);
        if shipped && date_shipped.is_none() {
            date_shipped = Some(now);
        }
        Self {
            shipped,
            date_shipped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRevenue {
    pub product_id: ProductId,
    pub product_name: String,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestSeller {
    pub product_id: ProductId,
    pub product_name: String,
    pub total_quantity: i64,
    pub total_revenue: Decimal,
}

/// Errors emitted when user-supplied orders or products fail validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderValidationError {
    #[error("field `{0}` must not be blank")]
    BlankField(&'static str),
    #[error("field `{field}` must not be negative (got {value})")]
    NegativeAmount { field: &'static str, value: Decimal },
    #[error("quantity for product {product_id} must be at least 1 (got {quantity})")]
    InvalidQuantity { product_id: ProductId, quantity: i32 },
}

fn require_text(field: &'static str, value: &str) -> Result<(), OrderValidationError> {
    if value.trim().is_empty() {
        return Err(OrderValidationError::BlankField(field));
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: Decimal) -> Result<(), OrderValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(OrderValidationError::NegativeAmount { field, value });
    }
    Ok(())
}

fn require_quantity(product_id: ProductId, quantity: i32) -> Result<(), OrderValidationError> {
    if quantity < 1 {
        return Err(OrderValidationError::InvalidQuantity {
            product_id,
            quantity,
        });
    }
    Ok(())
}
