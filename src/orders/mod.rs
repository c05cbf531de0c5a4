//! Orders
//!
//! Immutable order snapshots. Everything an order shows is copied into it at
//! checkout, so later catalog or coupon changes never alter a placed order.

use std::fmt;

use jiff::Timestamp;
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};

use crate::{
    cache::UserId,
    collections::CartEntry,
    coupons::CouponDiscount,
    products::ProductId,
};

pub mod checkout;
pub mod history;

pub use checkout::{CheckoutError, CheckoutRequest, OrderAssembler};
pub use history::OrderHistory;

/// Order identifier, `ORD-<unix millis>-<suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh identifier for an order placed at `now`.
    #[must_use]
    pub fn generate(now: Timestamp) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();

        Self(format!("ORD-{}-{}", now.as_millisecond(), suffix.to_ascii_uppercase()))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fulfilment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, not yet shipped
    #[default]
    Processing,

    /// Handed to the carrier
    Shipped,

    /// Received by the customer
    Delivered,

    /// Cancelled before delivery
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        })
    }
}

/// How the customer intends to pay. Only recorded; no payment is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment
    #[default]
    Card,

    /// Cash on delivery
    #[value(name = "cod", alias = "cash-on-delivery")]
    CashOnDelivery,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentMethod::Card => "card",
            PaymentMethod::CashOnDelivery => "cash on delivery",
        })
    }
}

/// Delivery address entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    /// Recipient name
    #[serde(default)]
    pub full_name: String,

    /// Street address
    pub address: String,

    /// City
    pub city: String,

    /// Postal or ZIP code
    pub postal_code: String,

    /// Contact phone number
    pub phone: String,

    /// Country
    #[serde(default)]
    pub country: String,
}

impl ShippingAddress {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("address", &self.address),
            ("city", &self.city),
            ("postalCode", &self.postal_code),
            ("phone", &self.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// Whether every required field is filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Product line frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    /// Product identifier
    pub product_id: ProductId,

    /// Name at checkout
    pub name: String,

    /// Unit price at checkout, minor units
    pub price: u64,

    /// Pre-discount unit price at checkout, minor units
    #[serde(default)]
    pub original_price: Option<u64>,

    /// Image at checkout
    pub image: String,

    /// Category at checkout
    pub category: String,

    /// Brand at checkout
    pub brand: String,

    /// Units ordered
    pub quantity: u32,
}

impl ItemSnapshot {
    /// Price of all units of this line in minor units.
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.price.saturating_mul(u64::from(self.quantity))
    }
}

impl From<&CartEntry> for ItemSnapshot {
    fn from(entry: &CartEntry) -> Self {
        let product = &entry.product;

        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            original_price: product.original_price,
            image: product.image.clone(),
            category: product.category.clone(),
            brand: product.brand.clone(),
            quantity: entry.quantity,
        }
    }
}

/// Coupon as it was applied to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    /// Code entered
    pub code: String,

    /// Discount kind and value
    #[serde(flatten)]
    pub terms: CouponDiscount,

    /// Amount it took off, minor units
    pub discount: u64,
}

/// Placed order. Never modified after checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    /// Order identifier
    pub order_id: OrderId,

    /// Customer who placed the order
    pub user: UserId,

    /// Frozen product lines
    pub items: Vec<ItemSnapshot>,

    /// Delivery address
    pub shipping_address: ShippingAddress,

    /// Subtotal, minor units
    pub total_amount: u64,

    /// Tax, minor units
    pub tax: u64,

    /// Shipping charge, minor units
    #[serde(default)]
    pub shipping: u64,

    /// Coupon discount, minor units
    pub discount: u64,

    /// Amount payable, minor units
    pub final_amount: u64,

    /// Coupon applied, if it granted a discount
    #[serde(default)]
    pub coupon: Option<AppliedCoupon>,

    /// Chosen payment method
    pub payment_method: PaymentMethod,

    /// Fulfilment status
    pub status: OrderStatus,

    /// When the order was placed
    pub order_date: Timestamp,

    /// Expected delivery
    pub estimated_delivery: Timestamp,
}

impl OrderSnapshot {
    /// Total number of units ordered.
    #[must_use]
    pub fn total_units(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}
