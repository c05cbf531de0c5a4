//! Pricing Config

use clap::Args;
use rust_decimal::Decimal;

use crate::pricing::PricingPolicy;

/// Tax and shipping settings.
#[derive(Debug, Clone, Args)]
pub struct PricingConfig {
    /// Tax rate as a fraction of the subtotal
    #[arg(long, env = "TAX_RATE", default_value = "0.10")]
    pub tax_rate: Decimal,

    /// Flat shipping charge in minor units
    #[arg(long, env = "SHIPPING_MINOR_UNITS", default_value_t = 0u64)]
    pub shipping: u64,
}

impl PricingConfig {
    /// Pricing policy for these settings.
    #[must_use]
    pub fn policy(&self) -> PricingPolicy {
        PricingPolicy {
            tax_rate: self.tax_rate,
            shipping: self.shipping,
        }
    }
}
