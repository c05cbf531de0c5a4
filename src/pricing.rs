//! Pricing
//!
//! Pure order pricing over a hydrated cart and an optional coupon. Nothing in
//! here performs I/O or keeps state; results are recomputed on every change.

use jiff::Timestamp;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money, MoneyError,
    iso::{self, Currency},
};
use thiserror::Error;

use crate::{collections::CartEntry, coupons::Coupon};

/// Currency every price in the store is expressed in.
#[must_use]
pub fn store_currency() -> &'static Currency {
    iso::USD
}

/// Wrap an amount of minor units as store-currency money.
#[must_use]
pub fn money(minor: u64) -> Money<'static, Currency> {
    Money::from_minor(i64::try_from(minor).unwrap_or(i64::MAX), store_currency())
}

/// Minor units of a non-negative amount; negative amounts read as zero.
#[must_use]
pub fn minor_units(amount: &Money<'_, Currency>) -> u64 {
    u64::try_from(amount.to_minor_units()).unwrap_or(0)
}

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// An amount does not fit in minor units.
    #[error("amount overflowed while pricing")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Store-wide pricing rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingPolicy {
    /// Tax as a fraction of the subtotal (0.10 = 10%).
    pub tax_rate: Decimal,

    /// Flat shipping charge in minor units.
    pub shipping: u64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(10, 2),
            shipping: 0,
        }
    }
}

/// Breakdown of an order's price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingResult {
    /// Σ price × quantity, at the already-discounted unit prices
    pub subtotal: Money<'static, Currency>,

    /// Markdown savings versus original prices. Informational only.
    pub product_savings: Money<'static, Currency>,

    /// Discount granted by the applied coupon
    pub coupon_discount: Money<'static, Currency>,

    /// Tax charged on the subtotal
    pub tax: Money<'static, Currency>,

    /// Shipping charge
    pub shipping: Money<'static, Currency>,

    /// Amount payable
    pub final_amount: Money<'static, Currency>,
}

impl PricingResult {
    /// Whether a coupon reduced the price.
    #[must_use]
    pub fn has_coupon_discount(&self) -> bool {
        self.coupon_discount.to_minor_units() > 0
    }
}

impl PricingPolicy {
    /// Price a cart.
    ///
    /// A coupon that is missing, inactive at `now` or ineligible for the cart
    /// contributes no discount.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when an amount exceeds minor-unit range.
    pub fn price(
        &self,
        entries: &[CartEntry],
        coupon: Option<&Coupon>,
        now: Timestamp,
    ) -> Result<PricingResult, PricingError> {
        let subtotal = subtotal(entries)?;
        let product_savings = product_savings(entries)?;

        let coupon_discount = match coupon {
            Some(coupon) => coupon_discount(coupon, entries, subtotal, now)?,
            None => 0,
        };

        let tax = apply_rate(subtotal, self.tax_rate)?;

        let gross = subtotal
            .checked_add(tax)
            .and_then(|amount| amount.checked_add(self.shipping))
            .ok_or(PricingError::Overflow)?;

        let final_amount = gross.saturating_sub(coupon_discount);

        Ok(PricingResult {
            subtotal: checked_money(subtotal)?,
            product_savings: checked_money(product_savings)?,
            coupon_discount: checked_money(coupon_discount)?,
            tax: checked_money(tax)?,
            shipping: checked_money(self.shipping)?,
            final_amount: checked_money(final_amount)?,
        })
    }
}

/// Price a cart under the default policy (10% tax, free shipping).
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when an amount exceeds minor-unit range.
pub fn price_cart(
    entries: &[CartEntry],
    coupon: Option<&Coupon>,
    now: Timestamp,
) -> Result<PricingResult, PricingError> {
    PricingPolicy::default().price(entries, coupon, now)
}

/// Σ price × quantity in minor units.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the sum does not fit.
pub fn subtotal(entries: &[CartEntry]) -> Result<u64, PricingError> {
    entries.iter().try_fold(0_u64, |acc, entry| {
        entry
            .product
            .price
            .checked_mul(u64::from(entry.quantity))
            .and_then(|line| acc.checked_add(line))
            .ok_or(PricingError::Overflow)
    })
}

fn product_savings(entries: &[CartEntry]) -> Result<u64, PricingError> {
    entries.iter().try_fold(0_u64, |acc, entry| {
        entry
            .product
            .unit_savings()
            .checked_mul(u64::from(entry.quantity))
            .and_then(|line| acc.checked_add(line))
            .ok_or(PricingError::Overflow)
    })
}

/// Discount a coupon grants on a cart, zero when it does not apply or its
/// terms are out of range.
///
/// Exclusion is all-or-nothing: one entry in an excluded category voids the
/// whole discount.
fn coupon_discount(
    coupon: &Coupon,
    entries: &[CartEntry],
    subtotal: u64,
    now: Timestamp,
) -> Result<u64, PricingError> {
    if !coupon.discount.is_well_formed()
        || !coupon.is_active(now)
        || coupon.check_eligibility(subtotal, entries).is_err()
    {
        return Ok(0);
    }

    coupon.discount_on(subtotal)
}

/// `amount × rate`, rounded half away from zero to whole minor units.
pub(crate) fn apply_rate(amount: u64, rate: Decimal) -> Result<u64, PricingError> {
    Decimal::from(amount)
        .checked_mul(rate)
        .map(|applied| applied.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_u64())
        .ok_or(PricingError::Overflow)
}

fn checked_money(minor: u64) -> Result<Money<'static, Currency>, PricingError> {
    let minor = i64::try_from(minor).map_err(|_overflow| PricingError::Overflow)?;

    Ok(Money::from_minor(minor, store_currency()))
}
