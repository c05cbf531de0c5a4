//! Coupon Fixtures

use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use smallvec::SmallVec;

use crate::{
    coupons::{Coupon, CouponDiscount, normalize_code},
    fixtures::{FixtureError, products::parse_store_price},
};

/// Wrapper for coupons in YAML
#[derive(Debug, Deserialize)]
pub struct CouponsFixture {
    /// Map of coupon code -> coupon fixture
    pub coupons: FxHashMap<String, CouponFixture>,
}

/// Coupon fixture from YAML
#[derive(Debug, Deserialize)]
pub struct CouponFixture {
    /// Discount configuration
    #[serde(flatten)]
    pub discount: DiscountFixture,

    /// Start of the validity window
    pub valid_from: Timestamp,

    /// End of the validity window
    pub valid_until: Timestamp,

    /// Total redemptions allowed
    #[serde(default)]
    pub usage_limit: Option<u64>,

    /// Redemptions so far
    #[serde(default)]
    pub used: u64,

    /// Whether the coupon is switched on
    #[serde(default = "enabled")]
    pub active: bool,

    /// Minimum order value (e.g., "200.00 USD")
    #[serde(default)]
    pub min_order: Option<String>,

    /// Categories that void the coupon
    #[serde(default)]
    pub excluded_categories: Vec<String>,
}

fn enabled() -> bool {
    true
}

/// Discount configuration from YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountFixture {
    /// Percentage off the subtotal
    Percentage {
        /// Percentage (e.g., "20%")
        value: String,
    },

    /// Fixed amount off the subtotal
    Fixed {
        /// Amount (e.g., "50.00 USD")
        value: String,
    },
}

impl TryFrom<DiscountFixture> for CouponDiscount {
    type Error = FixtureError;

    fn try_from(fixture: DiscountFixture) -> Result<Self, Self::Error> {
        match fixture {
            DiscountFixture::Percentage { value } => {
                Ok(CouponDiscount::Percentage(parse_percentage(&value)?))
            }
            DiscountFixture::Fixed { value } => {
                Ok(CouponDiscount::Fixed(parse_store_price(&value)?))
            }
        }
    }
}

impl CouponFixture {
    /// Convert to a [`Coupon`] with the given code
    ///
    /// # Errors
    ///
    /// Returns an error if the discount or minimum order value is invalid.
    pub fn try_into_coupon(self, code: &str) -> Result<Coupon, FixtureError> {
        let min_order_value = self
            .min_order
            .as_deref()
            .map(parse_store_price)
            .transpose()?
            .unwrap_or(0);

        Ok(Coupon {
            code: normalize_code(code),
            discount: self.discount.try_into()?,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            usage_limit_total: self.usage_limit,
            used_count: self.used,
            active: self.active,
            min_order_value,
            excluded_categories: SmallVec::from_vec(self.excluded_categories),
        })
    }
}

/// Parse percentage string (e.g., "20%" or "20") into a percentage value
///
/// # Errors
///
/// Returns an error if the string is not a number between 0 and 100.
pub fn parse_percentage(s: &str) -> Result<Decimal, FixtureError> {
    let trimmed = s.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();

    let value = number
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(FixtureError::InvalidPercentage(s.to_string()));
    }

    Ok(value)
}
