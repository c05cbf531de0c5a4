//! Coupons

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::{
    collections::{CartEntry, RemoteError},
    pricing::{PricingError, apply_rate, money, subtotal},
};

/// How a coupon reduces the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CouponDiscount {
    /// Percentage of the subtotal, e.g. `20` for 20% off.
    Percentage(Decimal),

    /// Fixed amount in minor units, capped at the subtotal.
    Fixed(u64),
}

impl CouponDiscount {
    /// Whether the terms make sense: percentages lie between 0 and 100.
    #[must_use]
    pub fn is_well_formed(self) -> bool {
        match self {
            CouponDiscount::Percentage(percent) => {
                (Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&percent)
            }
            CouponDiscount::Fixed(_) => true,
        }
    }

    /// Discount granted on `subtotal` minor units. Percentages are clamped
    /// to 0..=100, so the result never exceeds the subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when the percentage result does not fit.
    pub fn amount_on(self, subtotal: u64) -> Result<u64, PricingError> {
        match self {
            CouponDiscount::Percentage(percent) => {
                let percent = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
                let discount = apply_rate(subtotal, percent / Decimal::ONE_HUNDRED)?;

                Ok(discount.min(subtotal))
            }
            CouponDiscount::Fixed(amount) => Ok(amount.min(subtotal)),
        }
    }
}

/// Why a known coupon cannot be applied to the current cart.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IneligibleReason {
    /// Switched off by the store.
    #[error("this coupon is no longer active")]
    Inactive,

    /// Validity window has not opened yet.
    #[error("this coupon is not valid until {starts}")]
    NotYetValid {
        /// Start of the validity window
        starts: Timestamp,
    },

    /// Validity window has closed.
    #[error("this coupon expired on {ended}")]
    Expired {
        /// End of the validity window
        ended: Timestamp,
    },

    /// Discount terms are out of range, e.g. a negative percentage.
    #[error("this coupon's discount is not valid")]
    InvalidDiscount,

    /// Total usage limit reached.
    #[error("this coupon has reached its usage limit")]
    Exhausted,

    /// Cart subtotal is under the coupon's minimum order value.
    #[error("a minimum order of {} is required", money(*minimum))]
    BelowMinimum {
        /// Minimum order value in minor units
        minimum: u64,
    },

    /// Cart contains a product from an excluded category.
    #[error("this coupon cannot be used with {category} products")]
    ExcludedCategory {
        /// The offending category
        category: String,
    },
}

/// Errors surfaced when applying a coupon code.
#[derive(Debug, Error)]
pub enum CouponError {
    /// Blank or unknown code.
    #[error("invalid coupon code: {0:?}")]
    InvalidCode(String),

    /// Known coupon that does not apply.
    #[error(transparent)]
    Ineligible(#[from] IneligibleReason),

    /// Coupon service could not answer.
    #[error("coupon service failed: {0}")]
    Service(#[from] RemoteError),

    /// Cart could not be totalled.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Store-issued discount code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Code the customer enters
    pub code: String,

    /// Discount kind and value
    pub discount: CouponDiscount,

    /// Start of the validity window (inclusive)
    pub valid_from: Timestamp,

    /// End of the validity window (inclusive)
    pub valid_until: Timestamp,

    /// Maximum number of redemptions across all customers
    #[serde(default)]
    pub usage_limit_total: Option<u64>,

    /// Redemptions so far
    #[serde(default)]
    pub used_count: u64,

    /// Whether the store has the coupon switched on
    #[serde(default = "default_active")]
    pub active: bool,

    /// Minimum subtotal in minor units
    #[serde(default)]
    pub min_order_value: u64,

    /// Categories whose presence in the cart voids the coupon
    #[serde(default)]
    pub excluded_categories: SmallVec<[String; 4]>,
}

fn default_active() -> bool {
    true
}

impl Coupon {
    /// Switched on and inside its validity window at `now`.
    #[must_use]
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.check_window(now).is_ok()
    }

    /// Used as many times as its total limit allows.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit_total
            .is_some_and(|limit| self.used_count >= limit)
    }

    /// Check the active flag and validity window.
    ///
    /// # Errors
    ///
    /// Returns the first [`IneligibleReason`] that applies.
    pub fn check_window(&self, now: Timestamp) -> Result<(), IneligibleReason> {
        if !self.active {
            return Err(IneligibleReason::Inactive);
        }

        if now < self.valid_from {
            return Err(IneligibleReason::NotYetValid {
                starts: self.valid_from,
            });
        }

        if now > self.valid_until {
            return Err(IneligibleReason::Expired {
                ended: self.valid_until,
            });
        }

        Ok(())
    }

    /// Check the minimum order value and category exclusions against a cart.
    /// Categories compare ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns the first [`IneligibleReason`] that applies.
    pub fn check_eligibility(
        &self,
        subtotal: u64,
        entries: &[CartEntry],
    ) -> Result<(), IneligibleReason> {
        if subtotal < self.min_order_value {
            return Err(IneligibleReason::BelowMinimum {
                minimum: self.min_order_value,
            });
        }

        let excluded = entries.iter().find_map(|entry| {
            self.excluded_categories
                .iter()
                .find(|category| category.eq_ignore_ascii_case(&entry.product.category))
        });

        match excluded {
            Some(category) => Err(IneligibleReason::ExcludedCategory {
                category: category.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Discount on `subtotal`, ignoring eligibility.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when the result does not fit.
    pub fn discount_on(&self, subtotal: u64) -> Result<u64, PricingError> {
        self.discount.amount_on(subtotal)
    }
}

/// Validates coupon codes and records redemptions.
#[automock]
#[async_trait]
pub trait CouponService: Send + Sync {
    /// Look up a code. `Ok(None)` means the code is unknown.
    async fn validate(&self, code: &str) -> Result<Option<Coupon>, RemoteError>;

    /// Count one redemption of a code.
    async fn record_usage(&self, code: &str) -> Result<(), RemoteError>;
}

/// Normalize a code as typed by a customer.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Validate a code against the current cart.
///
/// The cart is only read.
///
/// # Errors
///
/// - [`CouponError::InvalidCode`] for a blank or unknown code.
/// - [`CouponError::Service`] when the service cannot answer.
/// - [`CouponError::Ineligible`] when the coupon is inactive, outside its
///   window, exhausted, under its minimum or voided by an excluded category.
pub async fn apply_coupon(
    service: &dyn CouponService,
    code: &str,
    entries: &[CartEntry],
    now: Timestamp,
) -> Result<Coupon, CouponError> {
    let code = normalize_code(code);

    if code.is_empty() {
        return Err(CouponError::InvalidCode(code));
    }

    let Some(coupon) = service.validate(&code).await? else {
        return Err(CouponError::InvalidCode(code));
    };

    if !coupon.discount.is_well_formed() {
        return Err(IneligibleReason::InvalidDiscount.into());
    }

    coupon.check_window(now)?;

    if coupon.is_exhausted() {
        return Err(IneligibleReason::Exhausted.into());
    }

    coupon.check_eligibility(subtotal(entries)?, entries)?;

    debug!(code = %coupon.code, "coupon applied");

    Ok(coupon)
}
