//! Receipt
//!
//! Terminal rendering of a priced cart or a placed order.

use std::io;

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{
    collections::CartEntry,
    orders::OrderSnapshot,
    pricing::{PricingResult, money},
};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The output could not be written.
    #[error("failed to write receipt: {0}")]
    Io(#[from] io::Error),
}

/// One product line of a receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    /// Product name
    pub name: String,

    /// Brand, possibly empty
    pub brand: String,

    /// Units
    pub quantity: u32,

    /// Unit price
    pub unit_price: Money<'static, Currency>,

    /// Pre-markdown unit price, when marked down
    pub original_price: Option<Money<'static, Currency>>,

    /// Unit price × quantity
    pub line_total: Money<'static, Currency>,
}

/// Order header shown above the lines of a placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptHeader {
    /// Order identifier
    pub order_id: String,

    /// Status, e.g. `processing`
    pub status: String,

    /// Placement date
    pub order_date: String,

    /// Expected delivery
    pub estimated_delivery: String,

    /// Payment method
    pub payment_method: String,

    /// Single-line delivery address
    pub ship_to: String,
}

/// Printable breakdown of a cart quote or an order.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    header: Option<ReceiptHeader>,
    lines: SmallVec<[ReceiptLine; 8]>,
    subtotal: Money<'static, Currency>,
    product_savings: Money<'static, Currency>,
    coupon: Option<(String, Money<'static, Currency>)>,
    tax: Money<'static, Currency>,
    shipping: Money<'static, Currency>,
    total: Money<'static, Currency>,
}

impl Receipt {
    /// Receipt for a cart priced but not yet ordered.
    #[must_use]
    pub fn quote(entries: &[CartEntry], pricing: &PricingResult, coupon_code: Option<&str>) -> Self {
        let lines = entries
            .iter()
            .map(|entry| ReceiptLine {
                name: entry.product.name.clone(),
                brand: entry.product.brand.clone(),
                quantity: entry.quantity,
                unit_price: money(entry.product.price),
                original_price: entry.product.original_price.map(money),
                line_total: money(entry.line_total()),
            })
            .collect();

        let coupon = coupon_code
            .filter(|_code| pricing.has_coupon_discount())
            .map(|code| (code.to_string(), pricing.coupon_discount));

        Self {
            header: None,
            lines,
            subtotal: pricing.subtotal,
            product_savings: pricing.product_savings,
            coupon,
            tax: pricing.tax,
            shipping: pricing.shipping,
            total: pricing.final_amount,
        }
    }

    /// Receipt for a placed order, built only from the order's own snapshot.
    #[must_use]
    pub fn from_order(order: &OrderSnapshot) -> Self {
        let lines = order
            .items
            .iter()
            .map(|item| ReceiptLine {
                name: item.name.clone(),
                brand: item.brand.clone(),
                quantity: item.quantity,
                unit_price: money(item.price),
                original_price: item.original_price.map(money),
                line_total: money(item.line_total()),
            })
            .collect();

        let product_savings = order
            .items
            .iter()
            .map(|item| {
                item.original_price
                    .map_or(0, |original| original.saturating_sub(item.price))
                    .saturating_mul(u64::from(item.quantity))
            })
            .fold(0_u64, u64::saturating_add);

        let address = &order.shipping_address;
        let ship_to = [
            address.full_name.as_str(),
            address.address.as_str(),
            address.city.as_str(),
            address.postal_code.as_str(),
            address.country.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            header: Some(ReceiptHeader {
                order_id: order.order_id.to_string(),
                status: order.status.to_string(),
                order_date: order.order_date.strftime("%Y-%m-%d %H:%M UTC").to_string(),
                estimated_delivery: order.estimated_delivery.strftime("%Y-%m-%d").to_string(),
                payment_method: order.payment_method.to_string(),
                ship_to,
            }),
            lines,
            subtotal: money(order.total_amount),
            product_savings: money(product_savings),
            coupon: order
                .coupon
                .as_ref()
                .map(|coupon| (coupon.code.clone(), money(coupon.discount))),
            tax: money(order.tax),
            shipping: money(order.shipping),
            total: money(order.final_amount),
        }
    }

    /// Product lines.
    #[must_use]
    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    /// Amount payable.
    #[must_use]
    pub fn total(&self) -> Money<'static, Currency> {
        self.total
    }

    /// Write the receipt as a table followed by a summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        if let Some(header) = &self.header {
            writeln!(out, "Order {} ({})", header.order_id, header.status)?;
            writeln!(out, "  Placed:    {}", header.order_date)?;
            writeln!(out, "  Delivery:  {}", header.estimated_delivery)?;
            writeln!(out, "  Payment:   {}", header.payment_method)?;
            writeln!(out, "  Ship to:   {}", header.ship_to)?;
        }

        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Brand", "Qty", "Price", "Was", "Total"]);

        for (idx, line) in self.lines.iter().enumerate() {
            builder.push_record([
                format!("#{:<3}", idx + 1),
                line.name.clone(),
                line.brand.clone(),
                line.quantity.to_string(),
                line.unit_price.to_string(),
                line.original_price
                    .map(|price| price.to_string())
                    .unwrap_or_default(),
                line.line_total.to_string(),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::new(3..7), Alignment::right());

        writeln!(out, "\n{table}")?;

        let mut summary: SmallVec<[(String, String); 6]> = SmallVec::new();

        summary.push(("Subtotal:".to_string(), self.subtotal.to_string()));

        if self.product_savings.to_minor_units() > 0 {
            summary.push(("You saved:".to_string(), self.product_savings.to_string()));
        }

        if let Some((code, discount)) = &self.coupon {
            summary.push((format!("Coupon {code}:"), format!("-{discount}")));
        }

        summary.push(("Tax:".to_string(), self.tax.to_string()));
        summary.push(("Shipping:".to_string(), shipping_label(self.shipping)));
        summary.push(("Total:".to_string(), self.total.to_string()));

        let label_width = summary.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        let value_width = summary.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

        for (label, value) in &summary {
            writeln!(out, " {label:>label_width$}  {value:>value_width$}")?;
        }

        writeln!(out)?;

        Ok(())
    }
}

fn shipping_label(shipping: Money<'static, Currency>) -> String {
    if shipping.to_minor_units() == 0 {
        "Free".to_string()
    } else {
        shipping.to_string()
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use testresult::TestResult;

    use crate::{
        cache::UserId,
        coupons::CouponDiscount,
        orders::{
            AppliedCoupon, ItemSnapshot, OrderId, OrderStatus, PaymentMethod, ShippingAddress,
        },
        pricing::price_cart,
        products::{ProductId, ProductSnapshot},
    };

    use super::*;

    fn entry(name: &str, price: u64, original_price: Option<u64>, quantity: u32) -> CartEntry {
        CartEntry {
            product: ProductSnapshot {
                id: ProductId::new(name),
                name: name.to_string(),
                price,
                original_price,
                image: String::new(),
                brand: "Northline".to_string(),
                category: "tops".to_string(),
            },
            quantity,
            added_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn quote_lists_lines_and_totals() -> TestResult {
        let entries = [entry("Tee", 50_00, Some(60_00), 2), entry("Denim", 30_00, None, 1)];
        let pricing = price_cart(&entries, None, Timestamp::now())?;

        let receipt = Receipt::quote(&entries, &pricing, Some("IGNORED"));

        let mut out = Vec::new();

        receipt.write_to(&mut out)?;

        let text = String::from_utf8(out)?;

        assert_eq!(receipt.lines().len(), 2);
        assert!(text.contains("Tee"), "missing line in:\n{text}");
        assert!(text.contains("$143.00"), "missing total in:\n{text}");
        assert!(text.contains("You saved:"), "missing savings in:\n{text}");
        assert!(text.contains("Free"), "missing shipping in:\n{text}");
        assert!(!text.contains("IGNORED"), "coupon without discount shown:\n{text}");

        Ok(())
    }

    #[test]
    fn order_receipt_uses_frozen_values() -> TestResult {
        let order = OrderSnapshot {
            order_id: OrderId::new("ORD-1-ABCDEF"),
            user: UserId::new("u-1"),
            items: vec![ItemSnapshot {
                product_id: ProductId::new("p-1"),
                name: "Classic Tee".to_string(),
                price: 50_00,
                original_price: None,
                image: String::new(),
                category: "tops".to_string(),
                brand: "Northline".to_string(),
                quantity: 2,
            }],
            shipping_address: ShippingAddress {
                full_name: "Ana Silva".to_string(),
                address: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                postal_code: "12345".to_string(),
                phone: "555-0100".to_string(),
                country: String::new(),
            },
            total_amount: 100_00,
            tax: 10_00,
            shipping: 0,
            discount: 20_00,
            final_amount: 90_00,
            coupon: Some(AppliedCoupon {
                code: "SAVE20".to_string(),
                terms: CouponDiscount::Percentage(20.into()),
                discount: 20_00,
            }),
            payment_method: PaymentMethod::CashOnDelivery,
            status: OrderStatus::Processing,
            order_date: "2026-03-01T12:00:00Z".parse()?,
            estimated_delivery: "2026-03-04T12:00:00Z".parse()?,
        };

        let receipt = Receipt::from_order(&order);

        let mut out = Vec::new();

        receipt.write_to(&mut out)?;

        let text = String::from_utf8(out)?;

        assert_eq!(receipt.total(), money(90_00));
        assert!(text.contains("ORD-1-ABCDEF"), "missing id in:\n{text}");
        assert!(text.contains("Coupon SAVE20:"), "missing coupon in:\n{text}");
        assert!(text.contains("-$20.00"), "missing discount in:\n{text}");
        assert!(text.contains("2026-03-04"), "missing delivery in:\n{text}");
        assert!(text.contains("Ana Silva, 1 Main St"), "missing address in:\n{text}");

        Ok(())
    }
}
